//! Tokens that move the offset to a location computed from the input.
use std::sync::Arc;

use bgdata::{encoding::Encoding, value::Value};
use log::debug;

use super::{ParseResult, Token};
use crate::{
    env::Environment,
    error::BgResult,
    expr::ValueExpression,
    graph::{ParseItem, ParseReference},
};

/// Parse `inner`, then jump to the offset held by one of the values it produced:
/// the one matching `target`, or the first one.
///
/// The jump is skipped when a value already starts at the destination, which
/// keeps self-referencing structures from looping.
pub(super) fn parse_sub(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    inner: &Arc<Token>,
    target: Option<&str>,
) -> BgResult<ParseResult> {
    let ParseResult::Success(parsed) = inner.parse(scope, &env.add_branch(token), encoding)? else {
        return Ok(ParseResult::Failure(env.clone()));
    };
    let parsed = parsed.close_branch()?;

    let produced = parsed.graph().values_since(env.graph());
    let designated = match target {
        Some(name) => produced.iter().find(|value| value.matches(name)),
        None => produced.head(),
    };
    let address = designated.map(|value| value.value().as_u64()).transpose()?;
    let Some(address) = address.flatten() else {
        debug!("{token:?}: no usable address produced");
        return Ok(ParseResult::Failure(env.clone()));
    };

    if parsed.graph().has_value_at(address) {
        debug!("{token:?}: offset {address} already parsed, not following");
        return Ok(ParseResult::Success(parsed));
    }
    Ok(ParseResult::Success(parsed.seek(address)))
}

/// Parse `inner` at every offset `address` evaluates to, then restore the offset.
///
/// An offset where this token already built a scope gets a reference to that
/// scope instead of being parsed again.
pub(super) fn parse_at(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    inner: &Arc<Token>,
    address: &ValueExpression,
) -> BgResult<ParseResult> {
    let addresses = address.eval(env, encoding)?;
    if addresses.is_empty() {
        debug!("{token:?}: address evaluates to nothing");
        return Ok(ParseResult::Failure(env.clone()));
    }

    let mut current = env.clone();
    for address in &addresses {
        let offset = address.as_ref().map(Value::as_u64).transpose()?;
        let Some(offset) = offset.flatten() else {
            debug!("{token:?}: address is not a non-negative offset");
            return Ok(ParseResult::Failure(env.clone()));
        };

        if current.graph().has_graph_at(token, offset) {
            current = current.add(ParseItem::Ref(ParseReference::new(offset, Arc::clone(token))));
            continue;
        }

        match inner.parse(scope, &current.seek(offset).add_branch(token), encoding)? {
            ParseResult::Success(next) => current = next.close_branch()?,
            ParseResult::Failure(_) => return Ok(ParseResult::Failure(env.clone())),
        }
    }
    Ok(ParseResult::Success(current.seek(env.offset())))
}
