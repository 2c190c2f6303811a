//! Short constructors for tokens and expressions, so grammars read like the
//! structures they describe.
//!
//! ```
//! use bgcore::shorthand::*;
//!
//! // A length byte followed by that many bytes of payload.
//! let record = seq("record", [
//!     def("length", con(1)),
//!     def("payload", name_ref("length")),
//! ]);
//! assert_eq!(record.name(), "record");
//! ```
use std::sync::Arc;

use bgdata::{
    encoding::{Encoding, Sign},
    value::Value,
};
use num_bigint::BigInt;
use num_traits::Signed;

use crate::{
    error::BgResult,
    expr::{
        BinaryOp, ComparisonOp, DigestAlgorithm, LogicalExpression, RefScope, UnaryOp,
        ValueExpression,
    },
    token::{BitField, Token, TokenKind},
};

// Tokens

/// Named value of `size` bytes.
pub fn def(name: &str, size: ValueExpression) -> Arc<Token> {
    def_where(name, size, always())
}

/// Named value of `size` bytes that must satisfy `predicate`.
pub fn def_where(name: &str, size: ValueExpression, predicate: LogicalExpression) -> Arc<Token> {
    Token::new(name, TokenKind::Def { size, predicate })
}

pub fn nod(size: ValueExpression) -> Arc<Token> {
    Token::new("", TokenKind::Nod { size })
}

pub fn seq(name: &str, tokens: impl IntoIterator<Item = Arc<Token>>) -> Arc<Token> {
    Token::new(name, TokenKind::Seq(tokens.into_iter().collect()))
}

pub fn cho(name: &str, tokens: impl IntoIterator<Item = Arc<Token>>) -> Arc<Token> {
    Token::new(name, TokenKind::Cho(tokens.into_iter().collect()))
}

pub fn rep(name: &str, inner: Arc<Token>) -> Arc<Token> {
    Token::new(name, TokenKind::Rep(inner))
}

pub fn rep_n(name: &str, inner: Arc<Token>, count: ValueExpression) -> Arc<Token> {
    Token::new(name, TokenKind::RepN { inner, count })
}

pub fn rep_while(name: &str, inner: Arc<Token>, predicate: LogicalExpression) -> Arc<Token> {
    Token::new(name, TokenKind::While { inner, predicate })
}

pub fn pre(name: &str, inner: Arc<Token>, guard: LogicalExpression) -> Arc<Token> {
    Token::new(name, TokenKind::Pre { inner, guard })
}

pub fn post(name: &str, inner: Arc<Token>, predicate: LogicalExpression) -> Arc<Token> {
    Token::new(name, TokenKind::Post { inner, predicate })
}

/// Follow the first value produced by `inner`.
pub fn sub(name: &str, inner: Arc<Token>) -> Arc<Token> {
    Token::new(name, TokenKind::Sub { inner, target: None })
}

/// Follow the value named `target` produced by `inner`.
pub fn sub_to(name: &str, inner: Arc<Token>, target: &str) -> Arc<Token> {
    Token::new(
        name,
        TokenKind::Sub {
            inner,
            target: Some(target.to_string()),
        },
    )
}

pub fn at(name: &str, inner: Arc<Token>, address: ValueExpression) -> Arc<Token> {
    Token::new(name, TokenKind::At { inner, address })
}

/// `size` bytes split into bit fields, most significant bit first.
pub fn bits(
    name: &str,
    size: ValueExpression,
    fields: impl IntoIterator<Item = BitField>,
) -> Arc<Token> {
    Token::new(
        name,
        TokenKind::Bits {
            size,
            fields: fields.into_iter().collect(),
        },
    )
}

/// Bit field `width` bits wide.
pub fn bit(name: &str, width: ValueExpression) -> BitField {
    BitField::new(name, width)
}

/// Refers to the enclosing token called `name`.
pub fn token_ref(name: &str) -> Arc<Token> {
    Token::new("", TokenKind::TokenRef(name.to_string()))
}

/// `token` read with `encoding`, for it and everything it contains.
pub fn encoded(token: &Arc<Token>, encoding: Encoding) -> Arc<Token> {
    token.with_encoding(encoding)
}

// Values

/// Integer constant; negative ones are signed.
pub fn con(value: impl Into<BigInt>) -> ValueExpression {
    let value = value.into();
    let encoding = if value.is_negative() {
        Encoding::default().with_sign(Sign::Signed)
    } else {
        Encoding::default()
    };
    ValueExpression::Const(Value::from_numeric(&value, encoding))
}

pub fn con_bytes(bytes: &[u8]) -> ValueExpression {
    ValueExpression::Const(Value::from_bytes(bytes.to_vec(), Encoding::default()))
}

pub fn con_str(text: &str) -> ValueExpression {
    ValueExpression::Const(Value::from_text(text, Encoding::default()))
}

pub fn current() -> ValueExpression {
    ValueExpression::Current
}

pub fn current_offset() -> ValueExpression {
    ValueExpression::CurrentOffset
}

pub fn current_iteration(level: usize) -> ValueExpression {
    ValueExpression::CurrentIteration(level)
}

/// Most recent visible value called `name`.
pub fn name_ref(name: &str) -> ValueExpression {
    ValueExpression::Ref {
        name: name.to_string(),
        scope: RefScope::Visible,
    }
}

/// Every value called `name`, oldest first.
pub fn all_refs(name: &str) -> ValueExpression {
    ValueExpression::Ref {
        name: name.to_string(),
        scope: RefScope::All,
    }
}

pub fn first(operand: ValueExpression) -> ValueExpression {
    ValueExpression::First(Box::new(operand))
}

pub fn last(operand: ValueExpression) -> ValueExpression {
    ValueExpression::Last(Box::new(operand))
}

pub fn nth(values: ValueExpression, indices: ValueExpression) -> ValueExpression {
    ValueExpression::Nth {
        values: Box::new(values),
        indices: Box::new(indices),
    }
}

pub fn count(operand: ValueExpression) -> ValueExpression {
    ValueExpression::Count(Box::new(operand))
}

pub fn len(operand: ValueExpression) -> ValueExpression {
    ValueExpression::Len(Box::new(operand))
}

pub fn offset(operand: ValueExpression) -> ValueExpression {
    ValueExpression::Offset(Box::new(operand))
}

pub fn reverse(operand: ValueExpression) -> ValueExpression {
    ValueExpression::Reverse(Box::new(operand))
}

pub fn cat(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    ValueExpression::Cat(Box::new(left), Box::new(right))
}

pub fn elvis(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    ValueExpression::Elvis(Box::new(left), Box::new(right))
}

fn binary(op: BinaryOp, left: ValueExpression, right: ValueExpression) -> ValueExpression {
    ValueExpression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn unary(op: UnaryOp, operand: ValueExpression) -> ValueExpression {
    ValueExpression::Unary {
        op,
        operand: Box::new(operand),
    }
}

pub fn add(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::Add, left, right)
}

pub fn subtract(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::Sub, left, right)
}

pub fn mul(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::Mul, left, right)
}

pub fn div(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::Div, left, right)
}

pub fn floor_div(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::FloorDiv, left, right)
}

pub fn modulo(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::Mod, left, right)
}

pub fn bit_and(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::And, left, right)
}

pub fn bit_or(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::Or, left, right)
}

pub fn shl(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::ShiftLeft, left, right)
}

pub fn shr(left: ValueExpression, right: ValueExpression) -> ValueExpression {
    binary(BinaryOp::ShiftRight, left, right)
}

pub fn neg(operand: ValueExpression) -> ValueExpression {
    unary(UnaryOp::Neg, operand)
}

pub fn bit_not(operand: ValueExpression) -> ValueExpression {
    unary(UnaryOp::Not, operand)
}

/// Digest of each operand value; `algorithm` is a name like `"SHA-256"`.
pub fn digest(operand: ValueExpression, algorithm: &str) -> BgResult<ValueExpression> {
    Ok(ValueExpression::Digest {
        algorithm: DigestAlgorithm::parse(algorithm)?,
        operand: Box::new(operand),
    })
}

// Logical

pub fn always() -> LogicalExpression {
    LogicalExpression::True
}

pub fn not(operand: LogicalExpression) -> LogicalExpression {
    LogicalExpression::Not(Box::new(operand))
}

pub fn and(left: LogicalExpression, right: LogicalExpression) -> LogicalExpression {
    LogicalExpression::And(Box::new(left), Box::new(right))
}

pub fn or(left: LogicalExpression, right: LogicalExpression) -> LogicalExpression {
    LogicalExpression::Or(Box::new(left), Box::new(right))
}

/// `left op right`.
pub fn compare_values(
    op: ComparisonOp,
    left: ValueExpression,
    right: ValueExpression,
) -> LogicalExpression {
    LogicalExpression::Compare {
        op,
        left: Some(Box::new(left)),
        right: Some(Box::new(right)),
    }
}

/// `current op operand`.
pub fn compare_current(op: ComparisonOp, operand: ValueExpression) -> LogicalExpression {
    LogicalExpression::Compare {
        op,
        left: None,
        right: Some(Box::new(operand)),
    }
}

pub fn eq(operand: ValueExpression) -> LogicalExpression {
    compare_current(ComparisonOp::Eq, operand)
}

pub fn eq_num(operand: ValueExpression) -> LogicalExpression {
    compare_current(ComparisonOp::EqNum, operand)
}

pub fn eq_str(operand: ValueExpression) -> LogicalExpression {
    compare_current(ComparisonOp::EqStr, operand)
}

pub fn gt_num(operand: ValueExpression) -> LogicalExpression {
    compare_current(ComparisonOp::GtNum, operand)
}

pub fn lt_num(operand: ValueExpression) -> LogicalExpression {
    compare_current(ComparisonOp::LtNum, operand)
}

pub fn gt_eq_num(operand: ValueExpression) -> LogicalExpression {
    compare_current(ComparisonOp::GtEqNum, operand)
}

pub fn lt_eq_num(operand: ValueExpression) -> LogicalExpression {
    compare_current(ComparisonOp::LtEqNum, operand)
}
