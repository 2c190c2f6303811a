use std::sync::Arc;

use bgdata::{DataError, encoding::Encoding, slice::Slice, value::Value};
use log::debug;

use super::{ParseResult, Token, eval_size};
use crate::{
    env::Environment,
    error::BgResult,
    expr::{LogicalExpression, ValueExpression},
    graph::{ParseItem, ParseValue},
};

pub(super) fn parse_def(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    size: &ValueExpression,
    predicate: &LogicalExpression,
) -> BgResult<ParseResult> {
    let Some(size) = eval_size(size, env, encoding)? else {
        debug!("{token:?}: size does not evaluate to a single non-negative value");
        return Ok(ParseResult::Failure(env.clone()));
    };
    let Some(slice) = Slice::from_source(env.source(), env.offset(), size)? else {
        debug!("{token:?}: {size} bytes not available at {}", env.offset());
        return Ok(ParseResult::Failure(env.clone()));
    };

    let value = Value::new(slice, encoding);
    let value = ParseValue::new(scope, value, env.offset(), Arc::clone(token));
    let next = env
        .add(ParseItem::Value(value))
        .seek(env.offset() + size as u64);

    if predicate.eval(&next, encoding)? {
        Ok(ParseResult::Success(next))
    } else {
        Ok(ParseResult::Failure(env.clone()))
    }
}

pub(super) fn parse_nod(
    env: &Environment,
    encoding: Encoding,
    size: &ValueExpression,
) -> BgResult<ParseResult> {
    let Some(size) = eval_size(size, env, encoding)? else {
        return Ok(ParseResult::Failure(env.clone()));
    };
    let available = env
        .source()
        .is_available(env.offset(), size)
        .map_err(|source| DataError::Io {
            offset: env.offset(),
            length: size,
            source,
        })?;
    if !available {
        return Ok(ParseResult::Failure(env.clone()));
    }
    Ok(ParseResult::Success(env.seek(env.offset() + size as u64)))
}
