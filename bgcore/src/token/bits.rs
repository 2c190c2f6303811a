use std::sync::Arc;

use bgdata::{encoding::Encoding, slice::Slice, value::Value};
use bit_set::BitSet;
use log::debug;

use super::{ParseResult, Token, eval_size};
use crate::{
    env::Environment,
    error::BgResult,
    expr::ValueExpression,
    graph::{ParseItem, ParseValue},
};

/// Named run of bits inside a [`TokenKind::Bits`](super::TokenKind::Bits) window.
#[derive(Debug, Clone)]
pub struct BitField {
    pub name: String,
    /// Width in bits; evaluated when the field is reached, so it may depend on
    /// earlier fields of the same window.
    pub size: ValueExpression,
}

impl BitField {
    pub fn new(name: impl Into<String>, size: ValueExpression) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

pub(super) fn parse_bits(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    size: &ValueExpression,
    fields: &[BitField],
) -> BgResult<ParseResult> {
    let Some(size) = eval_size(size, env, encoding)? else {
        debug!("{token:?}: size does not evaluate to a single non-negative value");
        return Ok(ParseResult::Failure(env.clone()));
    };
    let Some(slice) = Slice::from_source(env.source(), env.offset(), size)? else {
        return Ok(ParseResult::Failure(env.clone()));
    };

    // Big-endian view of the window: bit 0 is the most significant one.
    let window = Value::new(slice, encoding).normalized()?;
    let available = window.len() * 8;
    let mut consumed = 0usize;

    let mut current = env.add_branch(token);
    for field in fields {
        let Some(width) = eval_size(&field.size, &current, encoding)? else {
            debug!("{token:?}: width of `{}` is not a non-negative value", field.name);
            return Ok(ParseResult::Failure(env.clone()));
        };
        let Some(end) = consumed.checked_add(width).filter(|end| *end <= available) else {
            debug!("{token:?}: `{}` overflows the {size} byte window", field.name);
            return Ok(ParseResult::Failure(env.clone()));
        };

        // LSB-indexed bits of the field.
        let bits: BitSet = (0..width)
            .filter(|bit| {
                let position = end - 1 - bit;
                window[position / 8] & (0x80 >> (position % 8)) != 0
            })
            .collect();
        consumed = end;

        let name = Token::scoped_name_in(scope, &field.name);
        let value = Value::from_bits(&bits, width.div_ceil(8).max(1), encoding);
        current = current.add(ParseItem::Value(ParseValue::new(
            &name,
            value,
            env.offset(),
            Arc::clone(token),
        )));
    }

    let done = current.seek(env.offset() + size as u64).close_branch()?;
    Ok(ParseResult::Success(done))
}
