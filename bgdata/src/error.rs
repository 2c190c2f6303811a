use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    /// The underlying byte source reported an I/O failure. Reading past the end of
    /// the available data is never reported through this variant.
    #[error("I/O error while reading {length} bytes at offset {offset}: {source}")]
    Io {
        offset: u64,
        length: usize,
        source: std::io::Error,
    },
}

pub type DataResult<T> = Result<T, DataError>;
