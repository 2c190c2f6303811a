//! Interpretation settings attached to parses and values.
//!
//! An [`Encoding`] is the immutable triple {sign, character set, byte order}.
//! The byte order defines a byte-array transform applied before numeric and
//! bit-vector interpretation: identity for big-endian, full reversal for
//! little-endian. Textual interpretation never reorders bytes.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumIter, IntoEnumIterator};

/// Signedness used when interpreting bytes as an integer.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, EnumIter, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Sign {
    /// Two's complement.
    Signed,
    #[default]
    Unsigned,
}

impl Sign {
    /// Creates a [`Sign`] from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        Sign::iter().find(|sign| sign.to_str() == s)
    }

    /// Returns the string representation of the [`Sign`].
    pub fn to_str(&self) -> &'static str {
        match self {
            Sign::Signed => "signed",
            Sign::Unsigned => "unsigned",
        }
    }
}

/// Order of bytes for numeric and bit-vector views.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, EnumIter, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// Creates a [`ByteOrder`] from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        ByteOrder::iter().find(|order| order.to_str() == s)
    }

    /// Returns the string representation of the [`ByteOrder`].
    pub fn to_str(&self) -> &'static str {
        match self {
            ByteOrder::BigEndian => "big-endian",
            ByteOrder::LittleEndian => "little-endian",
        }
    }

    /// Bring `bytes` into big-endian order. Applying it twice is the identity.
    pub fn apply(&self, bytes: &[u8]) -> Vec<u8> {
        match self {
            ByteOrder::BigEndian => bytes.to_vec(),
            ByteOrder::LittleEndian => bytes.iter().rev().copied().collect(),
        }
    }
}

/// Character set used by the textual view.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, EnumIter, EnumIs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Charset {
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "ascii"))]
    Ascii,
    #[cfg_attr(feature = "serde", serde(rename = "iso-8859-1"))]
    Iso8859_1,
    #[cfg_attr(feature = "serde", serde(rename = "utf-8"))]
    Utf8,
    #[cfg_attr(feature = "serde", serde(rename = "utf-16be"))]
    Utf16Be,
    #[cfg_attr(feature = "serde", serde(rename = "utf-16le"))]
    Utf16Le,
}

impl Charset {
    /// Creates a [`Charset`] from its string representation (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        Charset::iter().find(|charset| charset.to_str().eq_ignore_ascii_case(s))
    }

    /// Returns the string representation of the [`Charset`].
    pub fn to_str(&self) -> &'static str {
        match self {
            Charset::Ascii => "ascii",
            Charset::Iso8859_1 => "iso-8859-1",
            Charset::Utf8 => "utf-8",
            Charset::Utf16Be => "utf-16be",
            Charset::Utf16Le => "utf-16le",
        }
    }

    /// Decode raw bytes. Undecodable input is replaced by U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Charset::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '\u{FFFD}' })
                .collect(),
            Charset::Iso8859_1 => bytes.iter().map(|&b| b as char).collect(),
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Utf16Be | Charset::Utf16Le => {
                let units: Vec<u16> = bytes
                    .chunks(2)
                    .map(|pair| match (self, pair) {
                        (Charset::Utf16Be, [hi, lo]) => u16::from_be_bytes([*hi, *lo]),
                        (_, [lo, hi]) => u16::from_le_bytes([*lo, *hi]),
                        // Odd trailing byte cannot form a code unit.
                        _ => 0xFFFD,
                    })
                    .collect();
                String::from_utf16_lossy(&units)
            }
        }
    }

    /// Encode text. Characters the charset cannot represent become `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Ascii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
            Charset::Iso8859_1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Charset::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }
}

/// The {sign, charset, byte order} triple governing how a byte slice is read.
///
/// Defaults are unsigned, ASCII and big-endian.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct Encoding {
    pub sign: Sign,
    pub charset: Charset,
    pub byte_order: ByteOrder,
}

impl Encoding {
    pub const fn new(sign: Sign, charset: Charset, byte_order: ByteOrder) -> Self {
        Self {
            sign,
            charset,
            byte_order,
        }
    }

    #[inline]
    pub const fn with_sign(self, sign: Sign) -> Self {
        Self { sign, ..self }
    }

    #[inline]
    pub const fn with_charset(self, charset: Charset) -> Self {
        Self { charset, ..self }
    }

    #[inline]
    pub const fn with_byte_order(self, byte_order: ByteOrder) -> Self {
        Self { byte_order, ..self }
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        self.sign.is_signed()
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.sign.to_str(),
            self.charset.to_str(),
            self.byte_order.to_str()
        )
    }
}
