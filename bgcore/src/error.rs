use std::path::PathBuf;

use bgdata::DataError;
use thiserror::Error;

/// Fatal errors: defects in the grammar or its usage, or I/O failures.
///
/// Input that does not match a grammar is never reported here; it is a
/// [`ParseResult::Failure`](crate::token::ParseResult::Failure).
#[derive(Debug, Error)]
pub enum BgError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Unknown digest algorithm `{0}`. Supported: SHA-224, SHA-256, SHA-384, SHA-512.")]
    UnknownDigestAlgorithm(String),

    #[error(
        "No graph defined by token `{token}` exists at offset {offset}. References must point into the already parsed graph."
    )]
    UnresolvedReference { token: String, offset: u64 },

    #[error("Cannot close a branch: the graph has no open branch.")]
    NoOpenBranch,

    #[error("Token reference `{0}` does not name any enclosing token.")]
    UnknownTokenReference(String),

    #[error("Failed to read configuration file '{}': {source}", file.display())]
    ConfigIo {
        file: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse configuration '{file}': {source}")]
    ConfigParse {
        file: String,
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Failed to write configuration file '{}': {source}", file.display())]
    ConfigWrite {
        file: PathBuf,
        source: std::io::Error,
    },
}

pub type BgResult<T> = Result<T, BgError>;
