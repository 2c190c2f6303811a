use std::sync::Arc;

use bgdata::encoding::Encoding;

use super::{ParseResult, Token};
use crate::{env::Environment, error::BgResult, expr::LogicalExpression};

pub(super) fn parse_seq(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    tokens: &[Arc<Token>],
) -> BgResult<ParseResult> {
    let mut current = env.add_branch(token);
    for child in tokens {
        match child.parse(scope, &current, encoding)? {
            ParseResult::Success(next) => current = next,
            ParseResult::Failure(_) => return Ok(ParseResult::Failure(env.clone())),
        }
    }
    Ok(ParseResult::Success(current.close_branch()?))
}

pub(super) fn parse_cho(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    tokens: &[Arc<Token>],
) -> BgResult<ParseResult> {
    let branched = env.add_branch(token);
    for alternative in tokens {
        // Every alternative starts from the same state.
        if let ParseResult::Success(next) = alternative.parse(scope, &branched, encoding)? {
            return Ok(ParseResult::Success(next.close_branch()?));
        }
    }
    Ok(ParseResult::Failure(env.clone()))
}

pub(super) fn parse_pre(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    inner: &Arc<Token>,
    guard: &LogicalExpression,
) -> BgResult<ParseResult> {
    if !guard.eval(env, encoding)? {
        return Ok(ParseResult::Success(env.clone()));
    }
    match inner.parse(scope, &env.add_branch(token), encoding)? {
        ParseResult::Success(next) => Ok(ParseResult::Success(next.close_branch()?)),
        ParseResult::Failure(_) => Ok(ParseResult::Failure(env.clone())),
    }
}

pub(super) fn parse_post(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    inner: &Arc<Token>,
    predicate: &LogicalExpression,
) -> BgResult<ParseResult> {
    let ParseResult::Success(next) = inner.parse(scope, &env.add_branch(token), encoding)? else {
        return Ok(ParseResult::Failure(env.clone()));
    };
    let next = next.close_branch()?;
    if predicate.eval(&next, encoding)? {
        Ok(ParseResult::Success(next))
    } else {
        Ok(ParseResult::Failure(env.clone()))
    }
}
