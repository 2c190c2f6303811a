//! Immutable values: a byte slice plus the encoding it is read with.
//!
//! All views are computed on demand from the slice's bytes, and fail only when
//! a deferred slice cannot be read back from its source:
//! - numeric: the byte-order-normalized bytes as an arbitrary-precision integer,
//!   two's complement when signed;
//! - textual: the raw bytes decoded with the charset (no byte reordering);
//! - bit-vector: the normalized bits, index 0 being the least-significant bit.
use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use bit_set::BitSet;
use num_bigint::{BigInt, Sign as BigSign};
use num_traits::{ToPrimitive, Zero};

use crate::{encoding::Encoding, error::DataResult, slice::Slice};

#[derive(Clone)]
pub struct Value {
    slice: Slice,
    encoding: Encoding,
}

impl Value {
    pub fn new(slice: Slice, encoding: Encoding) -> Self {
        Self { slice, encoding }
    }

    /// Wrap literal bytes, stored as given.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, encoding: Encoding) -> Self {
        Self::new(Slice::literal(bytes), encoding)
    }

    /// Encode an integer so that [`Value::as_numeric`] gives it back.
    ///
    /// The minimal two's complement representation is used; for unsigned
    /// encodings a leading zero byte that only carries the sign is dropped. The
    /// bytes are then laid out in the encoding's byte order.
    pub fn from_numeric(value: &BigInt, encoding: Encoding) -> Self {
        let mut bytes = value.to_signed_bytes_be();
        if !encoding.is_signed() && bytes.len() > 1 && bytes[0] == 0 {
            bytes.remove(0);
        }
        let bytes = encoding.byte_order.apply(&bytes);
        Self::from_bytes(bytes, encoding)
    }

    /// Encode text with the encoding's charset.
    pub fn from_text(text: &str, encoding: Encoding) -> Self {
        Self::from_bytes(encoding.charset.encode(text), encoding)
    }

    /// Build a value from a bit-vector, at least `min_len` bytes long.
    pub fn from_bits(bits: &BitSet, min_len: usize, encoding: Encoding) -> Self {
        let needed = bits.iter().max().map_or(0, |highest| highest / 8 + 1);
        let len = needed.max(min_len);
        let mut normalized = vec![0u8; len];
        for bit in bits.iter() {
            normalized[len - 1 - bit / 8] |= 1 << (bit % 8);
        }
        Self::from_bytes(encoding.byte_order.apply(&normalized), encoding)
    }

    #[inline]
    pub fn slice(&self) -> &Slice {
        &self.slice
    }

    /// Raw bytes, in input order. Deferred values are read from their source.
    #[inline]
    pub fn bytes(&self) -> DataResult<Arc<[u8]>> {
        self.slice.bytes()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slice.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Absolute offset in the input, `None` for computed values.
    #[inline]
    pub fn source_offset(&self) -> Option<u64> {
        self.slice.source_offset()
    }

    /// Same bytes, read with another encoding.
    pub fn with_encoding(&self, encoding: Encoding) -> Self {
        Self::new(self.slice.clone(), encoding)
    }

    /// Bytes in big-endian order.
    pub fn normalized(&self) -> DataResult<Vec<u8>> {
        Ok(self.encoding.byte_order.apply(&self.bytes()?))
    }

    pub fn as_numeric(&self) -> DataResult<BigInt> {
        let normalized = self.normalized()?;
        Ok(if normalized.is_empty() {
            BigInt::zero()
        } else if self.encoding.is_signed() {
            BigInt::from_signed_bytes_be(&normalized)
        } else {
            BigInt::from_bytes_be(BigSign::Plus, &normalized)
        })
    }

    /// Numeric view as a `u64`, `None` if it does not fit.
    pub fn as_u64(&self) -> DataResult<Option<u64>> {
        Ok(self.as_numeric()?.to_u64())
    }

    /// Numeric view as a `usize`, `None` if it does not fit.
    pub fn as_usize(&self) -> DataResult<Option<usize>> {
        Ok(self.as_numeric()?.to_usize())
    }

    pub fn as_text(&self) -> DataResult<String> {
        Ok(self.encoding.charset.decode(&self.bytes()?))
    }

    pub fn as_bits(&self) -> DataResult<BitSet> {
        let normalized = self.normalized()?;
        let len = normalized.len();
        let mut bits = BitSet::with_capacity(len * 8);
        for (index, byte) in normalized.iter().enumerate() {
            let base = (len - 1 - index) * 8;
            for bit in 0..8 {
                if byte & (1 << bit) != 0 {
                    bits.insert(base + bit);
                }
            }
        }
        Ok(bits)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        // Equal encodings imply equal byte orders, so raw equality is
        // equivalent to comparing normalized bytes. Deferred values compare by
        // the range they cover.
        self.encoding == other.encoding
            && match (self.slice.resident(), other.slice.resident()) {
                (Some(a), Some(b)) => a == b,
                (None, None) => self.slice.same_range(&other.slice),
                _ => false,
            }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoding.hash(state);
        match self.slice.resident() {
            Some(data) => data.hash(state),
            None => (self.source_offset(), self.len()).hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(data) = self.slice.resident() else {
            return write!(f, "<{} bytes>", self.len());
        };
        write!(f, "0x")?;
        for byte in data {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({self} {})", self.encoding)
    }
}
