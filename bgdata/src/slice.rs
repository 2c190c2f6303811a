//! Immutable byte ranges with provenance.
use std::{fmt, io, sync::Arc};

use crate::{
    error::{DataError, DataResult},
    source::ByteSource,
};

/// Source-backed slices up to this length are read when they are created.
/// Longer ones stay in the source and are read on demand.
pub const RESIDENT_LIMIT: usize = 4096;

/// Where the bytes of a [`Slice`] come from.
#[derive(Clone)]
pub enum Origin {
    /// Read from the input at the slice's offset.
    Source(Arc<dyn ByteSource>),
    /// Computed or literal bytes with no location in the input.
    Literal,
}

/// An immutable byte range.
///
/// Slices created from a source remember the source and the absolute offset
/// they start at. Short ones keep a copy of their bytes; anything longer than
/// [`RESIDENT_LIMIT`] is deferred: it holds no bytes, [`Slice::bytes`] reads
/// the whole range again on every call and [`Slice::chunks`] streams it.
#[derive(Clone)]
pub struct Slice {
    origin: Origin,
    offset: u64,
    len: usize,
    resident: Option<Arc<[u8]>>,
}

fn io_error(offset: u64, length: usize) -> impl FnOnce(io::Error) -> DataError {
    move |source| DataError::Io {
        offset,
        length,
        source,
    }
}

impl Slice {
    /// Slice `length` bytes at `offset`. Returns `Ok(None)` when the source holds
    /// fewer bytes than requested; nothing is allocated in that case.
    pub fn from_source(
        source: &Arc<dyn ByteSource>,
        offset: u64,
        length: usize,
    ) -> DataResult<Option<Self>> {
        if !source
            .is_available(offset, length)
            .map_err(io_error(offset, length))?
        {
            return Ok(None);
        }

        let resident = if length <= RESIDENT_LIMIT {
            let data = source.read(offset, length).map_err(io_error(offset, length))?;
            if data.len() < length {
                return Ok(None);
            }
            Some(data.into())
        } else {
            None
        };

        Ok(Some(Self {
            origin: Origin::Source(Arc::clone(source)),
            offset,
            len: length,
            resident,
        }))
    }

    /// Wrap literal bytes.
    pub fn literal(data: impl Into<Arc<[u8]>>) -> Self {
        let data: Arc<[u8]> = data.into();
        Self {
            origin: Origin::Literal,
            offset: 0,
            len: data.len(),
            resident: Some(data),
        }
    }

    /// The bytes, if they are held in memory.
    #[inline]
    pub fn resident(&self) -> Option<&[u8]> {
        self.resident.as_deref()
    }

    #[inline]
    pub fn is_resident(&self) -> bool {
        self.resident.is_some()
    }

    /// All bytes of the slice. Deferred slices are read from their source.
    pub fn bytes(&self) -> DataResult<Arc<[u8]>> {
        if let Some(resident) = &self.resident {
            return Ok(Arc::clone(resident));
        }
        let Origin::Source(source) = &self.origin else {
            return Ok(Arc::from(Vec::new()));
        };
        let data = source
            .read(self.offset, self.len)
            .map_err(io_error(self.offset, self.len))?;
        if data.len() < self.len {
            return Err(truncated(self.offset, self.len));
        }
        Ok(data.into())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset in the input, `None` for literal slices.
    pub fn source_offset(&self) -> Option<u64> {
        match self.origin {
            Origin::Source(_) => Some(self.offset),
            Origin::Literal => None,
        }
    }

    #[inline]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// True if both slices are deferred views of the same range of the same
    /// source.
    pub fn same_range(&self, other: &Self) -> bool {
        match (&self.origin, &other.origin) {
            (Origin::Source(a), Origin::Source(b)) => {
                Arc::ptr_eq(a, b) && self.offset == other.offset && self.len == other.len
            }
            _ => false,
        }
    }

    /// Stream the slice in chunks of at most `chunk_size` bytes.
    ///
    /// Resident slices are chunked in memory. Deferred slices issue one source
    /// read per chunk, so at most one chunk is held at a time.
    pub fn chunks(&self, chunk_size: usize) -> impl Iterator<Item = DataResult<Vec<u8>>> + '_ {
        let chunk_size = chunk_size.max(1);
        let mut position = 0usize;
        std::iter::from_fn(move || {
            if position >= self.len {
                return None;
            }
            let length = chunk_size.min(self.len - position);
            let chunk = match (&self.resident, &self.origin) {
                (Some(data), _) => Ok(data[position..position + length].to_vec()),
                (None, Origin::Source(source)) => {
                    let offset = self.offset + position as u64;
                    source
                        .read(offset, length)
                        .map_err(io_error(offset, length))
                        .and_then(|chunk| {
                            if chunk.len() < length {
                                Err(truncated(offset, length))
                            } else {
                                Ok(chunk)
                            }
                        })
                }
                (None, Origin::Literal) => Ok(Vec::new()),
            };
            position += length;
            Some(chunk)
        })
    }
}

// A deferred range was available when the slice was made but no longer is.
fn truncated(offset: u64, length: usize) -> DataError {
    DataError::Io {
        offset,
        length,
        source: io::Error::from(io::ErrorKind::UnexpectedEof),
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.source_offset(), self.resident()) {
            (Some(offset), Some(data)) => write!(f, "Slice(@{offset}, {data:02x?})"),
            (Some(offset), None) => write!(f, "Slice(@{offset}, {} bytes deferred)", self.len),
            (None, data) => write!(f, "Slice({:02x?})", data.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;

    fn source(bytes: Vec<u8>) -> Arc<dyn ByteSource> {
        Arc::new(InMemorySource::new(bytes))
    }

    #[test]
    fn from_source_checks_availability() {
        let source = source(vec![1u8, 2, 3]);
        let slice = Slice::from_source(&source, 1, 2).unwrap().unwrap();
        assert_eq!(slice.resident(), Some(&[2u8, 3][..]));
        assert_eq!(slice.source_offset(), Some(1));
        assert!(Slice::from_source(&source, 2, 2).unwrap().is_none());
    }

    #[test]
    fn huge_length_is_unavailable() {
        let mut bytes = vec![0x7Fu8];
        bytes.extend([0xFFu8; 7]);
        let source = source(bytes);
        assert!(Slice::from_source(&source, 0, usize::MAX).unwrap().is_none());
        assert!(Slice::from_source(&source, u64::MAX, 2).unwrap().is_none());
    }

    #[test]
    fn long_slices_are_deferred() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(RESIDENT_LIMIT + 1).collect();
        let source = source(bytes.clone());

        let short = Slice::from_source(&source, 0, RESIDENT_LIMIT).unwrap().unwrap();
        assert!(short.is_resident());

        let long = Slice::from_source(&source, 0, RESIDENT_LIMIT + 1).unwrap().unwrap();
        assert!(!long.is_resident());
        assert_eq!(long.len(), RESIDENT_LIMIT + 1);
        assert_eq!(&long.bytes().unwrap()[..], &bytes[..]);

        let again = Slice::from_source(&source, 0, RESIDENT_LIMIT + 1).unwrap().unwrap();
        assert!(long.same_range(&again));
        assert!(!long.same_range(&short));
    }

    #[test]
    fn chunks_cover_the_whole_slice() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(RESIDENT_LIMIT + 1300).collect();
        let source = source(bytes.clone());
        let slice = Slice::from_source(&source, 0, bytes.len()).unwrap().unwrap();

        let chunks: Vec<Vec<u8>> = slice.chunks(4096).collect::<Result<_, _>>().unwrap();
        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![4096, 1300]
        );
        assert_eq!(chunks.concat(), bytes);

        let literal = Slice::literal(vec![9u8; 3]);
        assert_eq!(literal.source_offset(), None);
        assert_eq!(literal.chunks(2).count(), 2);
    }
}
