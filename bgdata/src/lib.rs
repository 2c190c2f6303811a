//! Data model primitives for the bytegram parsing engine.
//!
//! This crate holds everything the engine needs to talk about bytes without
//! knowing anything about grammars:
//! - [`source::ByteSource`]: random-access reads at absolute offsets;
//! - [`encoding::Encoding`]: the {sign, charset, byte order} triple;
//! - [`slice::Slice`] and [`value::Value`]: immutable byte ranges and their
//!   numeric, textual and bit-vector views, long source ranges read on demand;
//! - [`list::ImmutableList`]: a persistent cons list with structural sharing;
//! - [`trampoline::Trampoline`]: constant-stack evaluation of recursive steps.
//!
//! Example
//! ```
//! use bgdata::encoding::{ByteOrder, Encoding};
//! use bgdata::value::Value;
//!
//! let le = Encoding::default().with_byte_order(ByteOrder::LittleEndian);
//! let value = Value::from_bytes(vec![0x01u8, 0x00], le);
//! assert_eq!(value.as_numeric().unwrap(), num_bigint::BigInt::from(1));
//! ```

pub mod encoding;
pub mod error;
pub mod list;
pub mod slice;
pub mod source;
pub mod trampoline;
pub mod value;

pub use error::{DataError, DataResult};
