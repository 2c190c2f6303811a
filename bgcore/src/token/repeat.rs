//! Repetition tokens.
//!
//! Iterations are driven through a [`Trampoline`], so a repetition that runs a
//! million times uses no more stack than one that runs once.
use std::sync::Arc;

use bgdata::{encoding::Encoding, trampoline::Trampoline};
use log::debug;

use super::{ParseResult, Token, eval_size};
use crate::{
    env::Environment,
    error::BgResult,
    expr::{LogicalExpression, ValueExpression},
};

pub(super) fn parse_rep(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    inner: &Arc<Token>,
) -> BgResult<ParseResult> {
    let start = env.add_branch(token).enter_iteration();
    let done = repeat(inner, scope, encoding, start).run()?;
    Ok(ParseResult::Success(done.exit_iteration().close_branch()?))
}

pub(super) fn parse_rep_n(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    inner: &Arc<Token>,
    count: &ValueExpression,
) -> BgResult<ParseResult> {
    let Some(count) = eval_size(count, env, encoding)? else {
        debug!("{token:?}: count does not evaluate to a single non-negative value");
        return Ok(ParseResult::Failure(env.clone()));
    };

    let start = env.add_branch(token).enter_iteration();
    match repeat_n(inner, scope, encoding, start, count).run()? {
        Some(done) => Ok(ParseResult::Success(done.exit_iteration().close_branch()?)),
        None => Ok(ParseResult::Failure(env.clone())),
    }
}

pub(super) fn parse_while(
    token: &Arc<Token>,
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    inner: &Arc<Token>,
    predicate: &LogicalExpression,
) -> BgResult<ParseResult> {
    let start = env.add_branch(token).enter_iteration();
    match repeat_while(inner, scope, encoding, predicate, start).run()? {
        Some(done) => Ok(ParseResult::Success(done.exit_iteration().close_branch()?)),
        None => Ok(ParseResult::Failure(env.clone())),
    }
}

// Stops at the first failing iteration, keeping every successful one. An
// iteration that consumes nothing is kept and ends the repetition.
fn repeat<'a>(
    inner: &'a Arc<Token>,
    scope: &'a str,
    encoding: Encoding,
    checkpoint: Environment,
) -> Trampoline<'a, BgResult<Environment>> {
    let next = match inner.parse(scope, &checkpoint, encoding) {
        Ok(ParseResult::Success(next)) => next,
        Ok(ParseResult::Failure(_)) => return Trampoline::Done(Ok(checkpoint)),
        Err(err) => return Trampoline::Done(Err(err)),
    };

    if next.offset() == checkpoint.offset() {
        debug!("{inner:?} made no progress at offset {}", next.offset());
        return Trampoline::Done(Ok(next));
    }
    Trampoline::more(move || repeat(inner, scope, encoding, next.next_iteration()))
}

fn repeat_n<'a>(
    inner: &'a Arc<Token>,
    scope: &'a str,
    encoding: Encoding,
    checkpoint: Environment,
    remaining: usize,
) -> Trampoline<'a, BgResult<Option<Environment>>> {
    if remaining == 0 {
        return Trampoline::Done(Ok(Some(checkpoint)));
    }
    match inner.parse(scope, &checkpoint, encoding) {
        Ok(ParseResult::Success(next)) => Trampoline::more(move || {
            repeat_n(inner, scope, encoding, next.next_iteration(), remaining - 1)
        }),
        Ok(ParseResult::Failure(_)) => Trampoline::Done(Ok(None)),
        Err(err) => Trampoline::Done(Err(err)),
    }
}

fn repeat_while<'a>(
    inner: &'a Arc<Token>,
    scope: &'a str,
    encoding: Encoding,
    predicate: &'a LogicalExpression,
    checkpoint: Environment,
) -> Trampoline<'a, BgResult<Option<Environment>>> {
    match predicate.eval(&checkpoint, encoding) {
        Ok(true) => {}
        Ok(false) => return Trampoline::Done(Ok(Some(checkpoint))),
        Err(err) => return Trampoline::Done(Err(err)),
    }
    match inner.parse(scope, &checkpoint, encoding) {
        Ok(ParseResult::Success(next)) => Trampoline::more(move || {
            repeat_while(inner, scope, encoding, predicate, next.next_iteration())
        }),
        Ok(ParseResult::Failure(_)) => Trampoline::Done(Ok(None)),
        Err(err) => Trampoline::Done(Err(err)),
    }
}
