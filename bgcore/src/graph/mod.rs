//! Persistent parse graph.
//!
//! A [`ParseGraph`] is one grammar scope: an immutable list of [`ParseItem`]s
//! (newest first) plus, while the scope is being parsed, at most one open
//! nested scope. Appending never mutates anything; it allocates new nodes that
//! share the unchanged tail. A graph obtained at any point of a parse therefore
//! stays valid forever, which is what makes backtracking a matter of reusing an
//! older reference.
//!
//! Items come in three shapes:
//! - [`ParseValue`]: a named value with its absolute offset and defining token;
//! - [`ParseGraph`]: a closed nested scope;
//! - [`ParseReference`]: "a graph defined by token T exists at offset O",
//!   resolved lazily with [`ParseGraph::resolve`].
mod query;

use std::{fmt, sync::Arc};

use bgdata::{list::ImmutableList, value::Value};
use strum::EnumIs;

use crate::{
    error::{BgError, BgResult},
    token::Token,
};

pub use query::Visit;

/// Separator between the scope segments of a value name.
pub const SCOPE_SEPARATOR: char = '.';

/// A named value produced by a successful token application.
#[derive(Clone)]
pub struct ParseValue {
    name: Arc<str>,
    value: Value,
    offset: u64,
    definition: Arc<Token>,
}

impl ParseValue {
    pub fn new(name: &str, value: Value, offset: u64, definition: Arc<Token>) -> Self {
        Self {
            name: name.into(),
            value,
            offset,
            definition,
        }
    }

    /// Fully scoped name, e.g. `header.length`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Absolute offset in the input where the value starts.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn definition(&self) -> &Arc<Token> {
        &self.definition
    }

    /// Returns true if `name` equals the full name or its trailing scope segments.
    pub fn matches(&self, name: &str) -> bool {
        match self.name.strip_suffix(name) {
            Some("") => true,
            Some(prefix) => prefix.ends_with(SCOPE_SEPARATOR),
            None => false,
        }
    }
}

impl PartialEq for ParseValue {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.offset == other.offset
            && self.value == other.value
            && self.definition.id() == other.definition.id()
    }
}

impl fmt::Debug for ParseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} = {:?}", self.name, self.offset, self.value)
    }
}

/// Lightweight pointer to a graph defined by `definition` at `location`.
#[derive(Clone)]
pub struct ParseReference {
    location: u64,
    definition: Arc<Token>,
}

impl ParseReference {
    pub fn new(location: u64, definition: Arc<Token>) -> Self {
        Self {
            location,
            definition,
        }
    }

    #[inline]
    pub fn location(&self) -> u64 {
        self.location
    }

    #[inline]
    pub fn definition(&self) -> &Arc<Token> {
        &self.definition
    }

    /// Resolve against the graph of the parse that produced this reference.
    pub fn resolve(&self, root: &ParseGraph) -> BgResult<ParseGraph> {
        root.resolve(self)
    }
}

impl PartialEq for ParseReference {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location && self.definition.id() == other.definition.id()
    }
}

impl fmt::Debug for ParseReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ref({:?}@{})", self.definition, self.location)
    }
}

/// Closed sum of everything a scope can hold.
#[derive(Clone, Debug, PartialEq, EnumIs)]
pub enum ParseItem {
    Value(ParseValue),
    Graph(ParseGraph),
    Ref(ParseReference),
}

impl ParseItem {
    pub fn as_value(&self) -> Option<&ParseValue> {
        match self {
            ParseItem::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&ParseGraph> {
        match self {
            ParseItem::Graph(graph) => Some(graph),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ParseReference> {
        match self {
            ParseItem::Ref(reference) => Some(reference),
            _ => None,
        }
    }

    /// Token that produced the item. The root graph has none.
    pub fn definition(&self) -> Option<&Arc<Token>> {
        match self {
            ParseItem::Value(value) => Some(value.definition()),
            ParseItem::Graph(graph) => graph.definition(),
            ParseItem::Ref(reference) => Some(reference.definition()),
        }
    }

    fn value_count(&self) -> usize {
        match self {
            ParseItem::Value(_) => 1,
            ParseItem::Graph(graph) => graph.value_count(),
            ParseItem::Ref(_) => 0,
        }
    }
}

/// One grammar scope of the parse output.
#[derive(Clone)]
pub struct ParseGraph {
    items: ImmutableList<ParseItem>,
    open: Option<Arc<ParseGraph>>,
    definition: Option<Arc<Token>>,
    offset: u64,
    // Values held by `items`, nested scopes included.
    closed_values: usize,
}

impl ParseGraph {
    /// Empty root graph.
    pub fn new() -> Self {
        Self {
            items: ImmutableList::new(),
            open: None,
            definition: None,
            offset: 0,
            closed_values: 0,
        }
    }

    fn scope(definition: Arc<Token>, offset: u64) -> Self {
        Self {
            definition: Some(definition),
            offset,
            ..Self::new()
        }
    }

    /// Token that opened this scope; `None` for the root.
    #[inline]
    pub fn definition(&self) -> Option<&Arc<Token>> {
        self.definition.as_ref()
    }

    /// Offset at which this scope was opened.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Items of this scope, newest first. The open scope, if any, is not included.
    #[inline]
    pub fn closed_items(&self) -> &ImmutableList<ParseItem> {
        &self.items
    }

    /// Nested scope currently being parsed.
    #[inline]
    pub fn open_branch(&self) -> Option<&ParseGraph> {
        self.open.as_deref()
    }

    #[inline]
    pub fn is_branched(&self) -> bool {
        self.open.is_some()
    }

    /// Returns true if the scope holds no item at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.open.is_none()
    }

    /// Number of value items in this scope and every nested scope.
    pub fn value_count(&self) -> usize {
        self.closed_values + self.open.as_ref().map_or(0, |open| open.value_count())
    }

    /// Append an item to the innermost open scope.
    pub fn add(&self, item: ParseItem) -> Self {
        match &self.open {
            Some(open) => Self {
                open: Some(Arc::new(open.add(item))),
                ..self.clone()
            },
            None => Self {
                closed_values: self.closed_values + item.value_count(),
                items: self.items.push(item),
                ..self.clone()
            },
        }
    }

    /// Open a nested scope for `definition` inside the innermost open scope.
    pub fn add_branch(&self, definition: Arc<Token>, offset: u64) -> Self {
        let open = match &self.open {
            Some(open) => open.add_branch(definition, offset),
            None => Self::scope(definition, offset),
        };
        Self {
            open: Some(Arc::new(open)),
            ..self.clone()
        }
    }

    /// Close the innermost open scope, turning it into a graph item of its parent.
    pub fn close_branch(&self) -> BgResult<Self> {
        let Some(open) = &self.open else {
            return Err(BgError::NoOpenBranch);
        };

        if open.is_branched() {
            return Ok(Self {
                open: Some(Arc::new(open.close_branch()?)),
                ..self.clone()
            });
        }

        let closed = ParseGraph::clone(open);
        Ok(Self {
            closed_values: self.closed_values + closed.value_count(),
            items: self.items.push(ParseItem::Graph(closed)),
            open: None,
            ..self.clone()
        })
    }

    /// Definitions of the open scopes, innermost first.
    pub fn open_definitions(&self) -> Vec<Arc<Token>> {
        let mut definitions = Vec::new();
        let mut scope = Some(self);
        while let Some(graph) = scope {
            if let Some(definition) = &graph.definition {
                definitions.push(Arc::clone(definition));
            }
            scope = graph.open.as_deref();
        }
        definitions.reverse();
        definitions
    }
}

impl Default for ParseGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ParseGraph {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
            && self.definition.as_ref().map(|d| d.id()) == other.definition.as_ref().map(|d| d.id())
            && self.open == other.open
            && self.items == other.items
    }
}

impl fmt::Debug for ParseGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for item in self.items().iter() {
            list.entry(item);
        }
        list.finish()?;
        if let Some(definition) = &self.definition {
            write!(f, " in {definition:?}@{}", self.offset)?;
        }
        Ok(())
    }
}
