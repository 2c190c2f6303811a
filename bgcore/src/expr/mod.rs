//! Expressions evaluated against an [`Environment`](crate::env::Environment).
//!
//! Value expressions produce a [`ValueList`]: an ordered list where each slot is
//! either a value or "no result". Logical expressions produce a boolean and are
//! used as predicates and guards by tokens.
pub mod digest;
pub mod logical;
mod ops;
pub mod value;

pub use digest::DigestAlgorithm;
pub use logical::{ComparisonOp, LogicalExpression};
pub use value::{BinaryOp, RefScope, UnaryOp, ValueExpression, ValueList};
