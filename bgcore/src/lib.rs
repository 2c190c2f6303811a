//! Declarative parsing of binary data into immutable parse graphs.
//!
//! A grammar is a tree of [`token::Token`]s built with the helpers in
//! [`shorthand`]. Applying the root token to a byte source produces a
//! [`token::ParseResult`] holding an [`env::Environment`], whose
//! [`graph::ParseGraph`] records every value read, organized in scopes that
//! mirror the grammar.
//!
//! ```
//! use std::sync::Arc;
//!
//! use bgcore::shorthand::*;
//! use bgdata::{encoding::Encoding, source::InMemorySource};
//!
//! let record = seq("record", [
//!     def("length", con(1)),
//!     def("payload", name_ref("length")),
//! ]);
//! let source = Arc::new(InMemorySource::new(vec![3u8, b'a', b'b', b'c']));
//!
//! let result = bgcore::parse(&record, source, Encoding::default()).unwrap();
//! assert!(result.succeeded());
//! let payload = result.environment().graph().find("payload").unwrap();
//! assert_eq!(payload.value().as_text().unwrap(), "abc");
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod expr;
pub mod graph;
pub mod shorthand;
pub mod token;

use std::sync::Arc;

use bgdata::{encoding::Encoding, source::ByteSource};
use log::info;

pub use config::Config;
pub use error::{BgError, BgResult};

use crate::{
    env::Environment,
    token::{ParseResult, Token},
};

/// Parse `source` from offset 0 with `token` as the root of the grammar.
pub fn parse(
    token: &Arc<Token>,
    source: Arc<dyn ByteSource>,
    encoding: Encoding,
) -> BgResult<ParseResult> {
    let result = token.parse("", &Environment::new(source), encoding)?;
    match &result {
        ParseResult::Success(env) => info!(
            "{:?} matched up to offset {} ({} values)",
            token,
            env.offset(),
            env.graph().value_count()
        ),
        ParseResult::Failure(_) => info!("{token:?} did not match"),
    }
    Ok(result)
}

pub mod prelude {
    pub use crate::{
        config::Config,
        env::Environment,
        error::{BgError, BgResult},
        graph::{ParseGraph, ParseItem, ParseReference, ParseValue},
        parse,
        shorthand::*,
        token::{ParseResult, Token, TokenKind},
    };
    pub use bgdata::{
        encoding::{ByteOrder, Charset, Encoding, Sign},
        source::{ByteSource, FileSource, InMemorySource},
        value::Value,
    };
}
