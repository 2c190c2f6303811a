use std::sync::Arc;

use bgdata::{list::ImmutableList, source::ByteSource};

use crate::{
    error::BgResult,
    graph::{ParseGraph, ParseItem},
    token::Token,
};

/// Complete parse state: where we are, what we read from, what we produced.
///
/// Like the graph it holds, an environment is never modified. Every operation
/// returns a new one, so a token can always fall back to the environment it
/// was given.
#[derive(Debug, Clone)]
pub struct Environment {
    offset: u64,
    source: Arc<dyn ByteSource>,
    graph: ParseGraph,
    iterations: ImmutableList<u64>,
}

impl Environment {
    pub fn new(source: Arc<dyn ByteSource>) -> Self {
        Self {
            offset: 0,
            source,
            graph: ParseGraph::new(),
            iterations: ImmutableList::new(),
        }
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn source(&self) -> &Arc<dyn ByteSource> {
        &self.source
    }

    #[inline]
    pub fn graph(&self) -> &ParseGraph {
        &self.graph
    }

    /// Iteration counters of the enclosing repetitions, innermost first.
    #[inline]
    pub fn iterations(&self) -> &ImmutableList<u64> {
        &self.iterations
    }

    /// Counter of the repetition `level` steps out from the innermost one.
    pub fn current_iteration(&self, level: usize) -> Option<u64> {
        self.iterations.iter().nth(level).copied()
    }

    pub fn seek(&self, offset: u64) -> Self {
        Self {
            offset,
            ..self.clone()
        }
    }

    pub fn add(&self, item: ParseItem) -> Self {
        Self {
            graph: self.graph.add(item),
            ..self.clone()
        }
    }

    /// Open a scope for `definition` at the current offset.
    pub fn add_branch(&self, definition: &Arc<Token>) -> Self {
        Self {
            graph: self.graph.add_branch(Arc::clone(definition), self.offset),
            ..self.clone()
        }
    }

    pub fn close_branch(&self) -> BgResult<Self> {
        Ok(Self {
            graph: self.graph.close_branch()?,
            ..self.clone()
        })
    }

    pub(crate) fn enter_iteration(&self) -> Self {
        Self {
            iterations: self.iterations.push(0),
            ..self.clone()
        }
    }

    pub(crate) fn next_iteration(&self) -> Self {
        let count = self.iterations.head().map_or(0, |count| count + 1);
        Self {
            iterations: self.iterations.tail().push(count),
            ..self.clone()
        }
    }

    pub(crate) fn exit_iteration(&self) -> Self {
        Self {
            iterations: self.iterations.tail(),
            ..self.clone()
        }
    }
}
