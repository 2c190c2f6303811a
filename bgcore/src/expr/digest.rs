use bgdata::{encoding::Encoding, slice::Slice, value::Value};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use strum::{EnumIter, IntoEnumIterator};

use crate::error::{BgError, BgResult};

/// Input is fed to the hash in pieces of this many bytes.
pub const DIGEST_CHUNK_SIZE: usize = 512;

/// Hash algorithms available to digest expressions.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EnumIter)]
pub enum DigestAlgorithm {
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Creates a [`DigestAlgorithm`] from its name, ignoring case and dashes.
    pub fn from_str(s: &str) -> Option<Self> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        DigestAlgorithm::iter().find(|algo| algo.to_str().replace('-', "") == wanted)
    }

    /// Like [`DigestAlgorithm::from_str`], failing on unknown names.
    pub fn parse(s: &str) -> BgResult<Self> {
        Self::from_str(s).ok_or_else(|| BgError::UnknownDigestAlgorithm(s.to_string()))
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha224 => "sha-224",
            DigestAlgorithm::Sha256 => "sha-256",
            DigestAlgorithm::Sha384 => "sha-384",
            DigestAlgorithm::Sha512 => "sha-512",
        }
    }

    /// Size of the digest in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha224 => 28,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }

    /// Hash the bytes of `value`. The result is tagged with `encoding`.
    pub fn digest(&self, value: &Value, encoding: Encoding) -> BgResult<Value> {
        let bytes = match self {
            DigestAlgorithm::Sha224 => stream::<Sha224>(value.slice())?,
            DigestAlgorithm::Sha256 => stream::<Sha256>(value.slice())?,
            DigestAlgorithm::Sha384 => stream::<Sha384>(value.slice())?,
            DigestAlgorithm::Sha512 => stream::<Sha512>(value.slice())?,
        };
        Ok(Value::from_bytes(bytes, encoding))
    }
}

fn stream<D: Digest>(slice: &Slice) -> BgResult<Vec<u8>> {
    let mut hasher = D::new();
    for chunk in slice.chunks(DIGEST_CHUNK_SIZE) {
        hasher.update(chunk?);
    }
    Ok(hasher.finalize().to_vec())
}
