//! Grammar tokens.
//!
//! A [`Token`] is an immutable grammar node. Applying it to an [`Environment`]
//! yields a [`ParseResult`]: on success the new environment, on failure the
//! environment it was given, untouched. Nothing is ever undone; a failing
//! token simply hands back its input.
//!
//! Every compound token opens a scope in the parse graph when it starts and
//! closes it when it succeeds, so the output mirrors the grammar. Names are
//! scoped the same way: a value defined by `length` inside `header` is called
//! `header.length`.
mod bits;
mod choice;
mod def;
mod redirect;
mod repeat;

use std::{fmt, sync::Arc};

use bgdata::encoding::Encoding;
use log::{debug, trace};
use strum::{EnumDiscriminants, EnumIs, EnumIter};
use uuid::Uuid;

use crate::{
    env::Environment,
    error::{BgError, BgResult},
    expr::{LogicalExpression, ValueExpression},
    graph::SCOPE_SEPARATOR,
};

pub use bits::BitField;

/// Outcome of applying a token.
#[derive(Debug, Clone, EnumIs)]
pub enum ParseResult {
    Success(Environment),
    Failure(Environment),
}

impl ParseResult {
    #[inline]
    pub fn succeeded(&self) -> bool {
        self.is_success()
    }

    pub fn environment(&self) -> &Environment {
        match self {
            ParseResult::Success(env) | ParseResult::Failure(env) => env,
        }
    }

    pub fn into_environment(self) -> Environment {
        match self {
            ParseResult::Success(env) | ParseResult::Failure(env) => env,
        }
    }
}

/// Shape of a token.
#[derive(Clone, EnumDiscriminants)]
#[strum_discriminants(name(TokenOp), derive(EnumIter, Hash))]
pub enum TokenKind {
    /// Read `size` bytes into a named value, then check `predicate`.
    Def {
        size: ValueExpression,
        predicate: LogicalExpression,
    },
    /// Skip `size` bytes without producing anything.
    Nod { size: ValueExpression },
    Seq(Vec<Arc<Token>>),
    /// First alternative that succeeds.
    Cho(Vec<Arc<Token>>),
    /// Zero or more applications; never fails.
    Rep(Arc<Token>),
    /// Exactly `count` applications.
    RepN {
        inner: Arc<Token>,
        count: ValueExpression,
    },
    /// Applications while `predicate` holds before each one.
    While {
        inner: Arc<Token>,
        predicate: LogicalExpression,
    },
    /// `inner` when `guard` holds, nothing otherwise.
    Pre {
        inner: Arc<Token>,
        guard: LogicalExpression,
    },
    /// `inner`, kept only if `predicate` holds afterwards.
    Post {
        inner: Arc<Token>,
        predicate: LogicalExpression,
    },
    /// `inner`, then continue at the offset held by a value it produced.
    Sub {
        inner: Arc<Token>,
        target: Option<String>,
    },
    /// `inner` at each offset of `address`, then come back.
    At {
        inner: Arc<Token>,
        address: ValueExpression,
    },
    /// A `size` byte window split into bit fields, most significant first.
    Bits {
        size: ValueExpression,
        fields: Vec<BitField>,
    },
    /// Enclosing token with this name, for recursive grammars.
    TokenRef(String),
}

impl TokenOp {
    pub fn opname(&self) -> &'static str {
        match self {
            TokenOp::Def => "def",
            TokenOp::Nod => "nod",
            TokenOp::Seq => "seq",
            TokenOp::Cho => "cho",
            TokenOp::Rep => "rep",
            TokenOp::RepN => "repn",
            TokenOp::While => "while",
            TokenOp::Pre => "pre",
            TokenOp::Post => "post",
            TokenOp::Sub => "sub",
            TokenOp::At => "at",
            TokenOp::Bits => "bits",
            TokenOp::TokenRef => "tokenref",
        }
    }

    /// Returns true if every successful parse of the token opens exactly one
    /// scope in the parse graph.
    ///
    /// `Pre` opens one only when its guard holds. `At` opens one per address it
    /// parses and none for addresses it only references. A token reference
    /// parses its target in place.
    pub fn is_scoped(&self) -> bool {
        !matches!(
            self,
            TokenOp::Def | TokenOp::Nod | TokenOp::TokenRef | TokenOp::Pre | TokenOp::At
        )
    }
}

/// Immutable grammar node.
pub struct Token {
    id: Uuid,
    name: String,
    encoding: Option<Encoding>,
    kind: TokenKind,
}

impl Token {
    pub fn new(name: impl Into<String>, kind: TokenKind) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            encoding: None,
            kind,
        })
    }

    /// Same token shape and name, read with `encoding` instead of the inherited one.
    ///
    /// The result is a distinct token: it gets a fresh identity.
    pub fn with_encoding(&self, encoding: Encoding) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            name: self.name.clone(),
            encoding: Some(encoding),
            kind: self.kind.clone(),
        })
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Encoding override, if any.
    #[inline]
    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    #[inline]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    #[inline]
    pub fn op(&self) -> TokenOp {
        TokenOp::from(&self.kind)
    }

    /// Name of the token inside `scope`. Unnamed tokens do not add a segment.
    pub fn scoped_name(&self, scope: &str) -> String {
        Self::scoped_name_in(scope, &self.name)
    }

    pub(crate) fn scoped_name_in(scope: &str, name: &str) -> String {
        match (scope.is_empty(), name.is_empty()) {
            (_, true) => scope.to_string(),
            (true, false) => name.to_string(),
            (false, false) => format!("{scope}{SCOPE_SEPARATOR}{name}"),
        }
    }

    /// Apply the token at the offset of `env`.
    ///
    /// `scope` is the name of the enclosing scope and `encoding` the inherited
    /// encoding. `Err` is only returned for fatal errors (I/O, malformed
    /// grammar); a mismatch is a [`ParseResult::Failure`].
    pub fn parse(
        self: &Arc<Self>,
        scope: &str,
        env: &Environment,
        encoding: Encoding,
    ) -> BgResult<ParseResult> {
        let encoding = self.encoding.unwrap_or(encoding);
        let scope = self.scoped_name(scope);
        trace!("{:?} at offset {}", self, env.offset());

        let result = match &self.kind {
            TokenKind::Def { size, predicate } => {
                def::parse_def(self, &scope, env, encoding, size, predicate)
            }
            TokenKind::Nod { size } => def::parse_nod(env, encoding, size),
            TokenKind::Seq(tokens) => choice::parse_seq(self, &scope, env, encoding, tokens),
            TokenKind::Cho(tokens) => choice::parse_cho(self, &scope, env, encoding, tokens),
            TokenKind::Rep(inner) => repeat::parse_rep(self, &scope, env, encoding, inner),
            TokenKind::RepN { inner, count } => {
                repeat::parse_rep_n(self, &scope, env, encoding, inner, count)
            }
            TokenKind::While { inner, predicate } => {
                repeat::parse_while(self, &scope, env, encoding, inner, predicate)
            }
            TokenKind::Pre { inner, guard } => {
                choice::parse_pre(self, &scope, env, encoding, inner, guard)
            }
            TokenKind::Post { inner, predicate } => {
                choice::parse_post(self, &scope, env, encoding, inner, predicate)
            }
            TokenKind::Sub { inner, target } => {
                redirect::parse_sub(self, &scope, env, encoding, inner, target.as_deref())
            }
            TokenKind::At { inner, address } => {
                redirect::parse_at(self, &scope, env, encoding, inner, address)
            }
            TokenKind::Bits { size, fields } => {
                bits::parse_bits(self, &scope, env, encoding, size, fields)
            }
            TokenKind::TokenRef(name) => parse_token_ref(&scope, env, encoding, name),
        }?;

        if result.is_failure() {
            debug!("{:?} failed at offset {}", self, env.offset());
        }
        Ok(result)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::TokenRef(target) => write!(f, "tokenref `{target}`"),
            _ => write!(f, "{} `{}`", self.op().opname(), self.name),
        }
    }
}

/// Evaluate `expression` to a single non-negative integer fitting a `usize`.
pub(crate) fn eval_size(
    expression: &ValueExpression,
    env: &Environment,
    encoding: Encoding,
) -> BgResult<Option<usize>> {
    match expression.eval_single(env, encoding)? {
        Some(value) => Ok(value.as_usize()?),
        None => Ok(None),
    }
}

fn parse_token_ref(
    scope: &str,
    env: &Environment,
    encoding: Encoding,
    name: &str,
) -> BgResult<ParseResult> {
    let target = env
        .graph()
        .open_definitions()
        .into_iter()
        .find(|definition| definition.name() == name)
        .ok_or_else(|| BgError::UnknownTokenReference(name.to_string()))?;
    target.parse(scope, env, encoding)
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::shorthand::{all_refs, always, at, bits, cho, con, def, nod, not, pre, rep, seq, sub};

    #[test]
    fn scoped_names() {
        let field = def("length", con(1));
        assert_eq!(field.scoped_name(""), "length");
        assert_eq!(field.scoped_name("header"), "header.length");
        let anonymous = seq("", [field]);
        assert_eq!(anonymous.scoped_name("header"), "header");
    }

    #[test]
    fn opnames_are_unique() {
        let mut names: Vec<_> = TokenOp::iter().map(|op| op.opname()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TokenOp::iter().count());
    }

    #[test]
    fn scoped_tokens_open_a_graph() {
        let source: Arc<dyn bgdata::source::ByteSource> =
            Arc::new(bgdata::source::InMemorySource::new(vec![1u8, 2]));
        let env = Environment::new(source);
        let tokens = [
            def("x", con(1)),
            seq("s", [def("x", con(1))]),
            cho("c", [def("x", con(1))]),
            rep("r", def("x", con(1))),
            sub("u", def("x", con(1))),
            bits("b", con(1), []),
        ];
        for token in tokens {
            let result = token.parse("", &env, Encoding::default()).unwrap();
            let newest = result.environment().graph().head().unwrap();
            assert_eq!(newest.is_graph(), token.op().is_scoped(), "{token:?}");
        }
    }

    #[test]
    fn conditional_scopes() {
        // Two one-byte addresses, then whatever `token` adds.
        let scopes = |addresses: [u8; 2], token: Arc<Token>| {
            let source: Arc<dyn bgdata::source::ByteSource> =
                Arc::new(bgdata::source::InMemorySource::new(addresses.to_vec()));
            let grammar = seq("", [def("p", con(1)), def("p", con(1)), token]);
            let result = grammar.parse("", &Environment::new(source), Encoding::default());
            let result = result.unwrap();
            assert!(result.succeeded());
            let graph = result.environment().graph();
            (graph.graphs().len() - 1, graph.get_all("p").len())
        };

        assert!(!TokenOp::Pre.is_scoped());
        assert_eq!(scopes([0, 1], pre("q", nod(con(0)), not(always()))), (0, 2));
        assert_eq!(scopes([0, 1], pre("q", nod(con(0)), always())), (1, 2));

        assert!(!TokenOp::At.is_scoped());
        let at_each = || at("a", def("x", con(1)), all_refs("p"));
        assert_eq!(scopes([0, 1], at_each()), (2, 2));
        // The second visit of offset 0 is a reference, not a scope.
        assert_eq!(scopes([0, 0], at_each()), (1, 2));
    }

    #[test]
    fn encoding_override_gets_new_identity() {
        let field = def("x", con(1));
        let little = field.with_encoding(Encoding::default());
        assert_ne!(field.id(), little.id());
        assert_eq!(little.name(), "x");
        assert_eq!(little.encoding(), Some(Encoding::default()));
        assert_eq!(field.encoding(), None);
    }
}
