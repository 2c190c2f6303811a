//! Read-only queries over a [`ParseGraph`].
//!
//! Every query that walks nested scopes goes through [`ParseGraph::try_walk`],
//! an explicit-stack traversal, so the depth of the output never turns into
//! call stack depth. Queries that only need the newest matches stop early.
use std::{ops::ControlFlow, sync::Arc};

use bgdata::list::{self, ImmutableList};
use smallvec::SmallVec;

use super::{ParseGraph, ParseItem, ParseReference, ParseValue};
use crate::{
    error::{BgError, BgResult},
    token::Token,
};

/// Item seen by [`ParseGraph::walk`].
#[derive(Debug, Clone, Copy)]
pub enum Visit<'a> {
    Value(&'a ParseValue),
    Graph(&'a ParseGraph),
    Ref(&'a ParseReference),
}

impl ParseGraph {
    /// Visit every item reachable from this graph, newest first.
    ///
    /// A nested scope is visited right before its own content, and its content
    /// before anything older than the scope. Open scopes are included. As a
    /// consequence values come out in strict reverse order of production.
    pub fn walk<'a>(&'a self, mut visit: impl FnMut(Visit<'a>)) {
        self.try_walk(|item| {
            visit(item);
            ControlFlow::<()>::Continue(())
        });
    }

    /// Like [`ParseGraph::walk`], stopping at the first visit that breaks.
    /// Returns the break value, if any.
    pub fn try_walk<'a, B>(
        &'a self,
        mut visit: impl FnMut(Visit<'a>) -> ControlFlow<B>,
    ) -> Option<B> {
        let mut stack: SmallVec<[list::Iter<'a, ParseItem>; 16]> = SmallVec::new();
        let mut entering = Some(self);

        loop {
            if let Some(scope) = entering.take() {
                stack.push(scope.items.iter());
                if let Some(open) = scope.open.as_deref() {
                    if let ControlFlow::Break(found) = visit(Visit::Graph(open)) {
                        return Some(found);
                    }
                    entering = Some(open);
                }
                continue;
            }

            let Some(cursor) = stack.last_mut() else {
                break;
            };
            let flow = match cursor.next() {
                None => {
                    stack.pop();
                    continue;
                }
                Some(ParseItem::Value(value)) => visit(Visit::Value(value)),
                Some(ParseItem::Ref(reference)) => visit(Visit::Ref(reference)),
                Some(ParseItem::Graph(graph)) => {
                    entering = Some(graph);
                    visit(Visit::Graph(graph))
                }
            };
            if let ControlFlow::Break(found) = flow {
                return Some(found);
            }
        }
        None
    }

    /// Items of this scope, oldest first, the open scope (if any) last.
    pub fn items(&self) -> ImmutableList<ParseItem> {
        let newest_first = match &self.open {
            Some(open) => self.items.push(ParseItem::Graph(ParseGraph::clone(open))),
            None => self.items.clone(),
        };
        newest_first.reverse()
    }

    /// Newest item of the innermost open scope.
    pub fn head(&self) -> Option<ParseItem> {
        match &self.open {
            Some(open) => open.head(),
            None => self.items.head().cloned(),
        }
    }

    /// Most recently produced value: the value being validated by a predicate.
    ///
    /// The search starts in the innermost open scope and moves outward; closed
    /// nested scopes are entered, since their content is newer than anything
    /// that precedes them.
    pub fn current(&self) -> Option<ParseValue> {
        self.open_scopes()
            .iter()
            .rev()
            .find_map(|scope| newest_value(&scope.items))
            .cloned()
    }

    /// Most recent value visible under `name`.
    ///
    /// Scopes are searched from the innermost open one outward. Inside a scope
    /// values are searched newest first; closed nested scopes are not entered.
    pub fn get(&self, name: &str) -> Option<ParseValue> {
        self.open_scopes().iter().rev().find_map(|scope| {
            scope
                .items
                .iter()
                .filter_map(ParseItem::as_value)
                .find(|value| value.matches(name))
                .cloned()
        })
    }

    /// Most recent value named `name` anywhere in the graph, closed scopes included.
    pub fn find(&self, name: &str) -> Option<ParseValue> {
        self.try_walk(|visit| match visit {
            Visit::Value(value) if value.matches(name) => ControlFlow::Break(value.clone()),
            _ => ControlFlow::Continue(()),
        })
    }

    /// Every value named `name` anywhere in the graph, oldest first.
    pub fn get_all(&self, name: &str) -> ImmutableList<ParseValue> {
        let mut found = ImmutableList::new();
        self.walk(|visit| {
            if let Visit::Value(value) = visit {
                if value.matches(name) {
                    found = found.push(value.clone());
                }
            }
        });
        found
    }

    /// Every value in the graph, oldest first.
    pub fn values(&self) -> ImmutableList<ParseValue> {
        let mut found = ImmutableList::new();
        self.walk(|visit| {
            if let Visit::Value(value) = visit {
                found = found.push(value.clone());
            }
        });
        found
    }

    /// Values produced after `checkpoint`, oldest first.
    ///
    /// `checkpoint` must be an earlier state of this same graph. Only the new
    /// values are visited.
    pub fn values_since(&self, checkpoint: &ParseGraph) -> ImmutableList<ParseValue> {
        let mut remaining = self.value_count().saturating_sub(checkpoint.value_count());
        let mut found = ImmutableList::new();
        if remaining == 0 {
            return found;
        }
        self.try_walk(|visit| {
            if let Visit::Value(value) = visit {
                found = found.push(value.clone());
                remaining -= 1;
                if remaining == 0 {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        });
        found
    }

    /// Every nested scope, open or closed, oldest first.
    pub fn graphs(&self) -> ImmutableList<ParseGraph> {
        let mut found = ImmutableList::new();
        self.walk(|visit| {
            if let Visit::Graph(graph) = visit {
                found = found.push(graph.clone());
            }
        });
        found
    }

    /// Returns true if some value starts at `offset`.
    pub fn has_value_at(&self, offset: u64) -> bool {
        self.try_walk(|visit| match visit {
            Visit::Value(value) if value.offset() == offset => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        })
        .is_some()
    }

    /// Returns true if a scope opened by `definition` at `offset` exists.
    pub fn has_graph_at(&self, definition: &Arc<Token>, offset: u64) -> bool {
        self.find_graph(definition, offset).is_some()
    }

    /// Resolve a reference to the scope it points to.
    pub fn resolve(&self, reference: &ParseReference) -> BgResult<ParseGraph> {
        self.find_graph(reference.definition(), reference.location())
            .cloned()
            .ok_or_else(|| BgError::UnresolvedReference {
                token: reference.definition().name().to_string(),
                offset: reference.location(),
            })
    }

    // This graph followed by its open scopes, outermost first.
    fn open_scopes(&self) -> SmallVec<[&ParseGraph; 16]> {
        let mut scopes = SmallVec::new();
        let mut scope = Some(self);
        while let Some(graph) = scope {
            scopes.push(graph);
            scope = graph.open.as_deref();
        }
        scopes
    }

    // Oldest matching scope.
    fn find_graph(&self, definition: &Arc<Token>, offset: u64) -> Option<&ParseGraph> {
        let mut found = None;
        self.walk(|visit| {
            if let Visit::Graph(graph) = visit {
                let same_token = graph
                    .definition
                    .as_ref()
                    .is_some_and(|d| d.id() == definition.id());
                if same_token && graph.offset == offset {
                    found = Some(graph);
                }
            }
        });
        found
    }
}

// Newest value among `items` and the closed scopes they contain.
fn newest_value(items: &ImmutableList<ParseItem>) -> Option<&ParseValue> {
    let mut stack: SmallVec<[list::Iter<'_, ParseItem>; 16]> = SmallVec::new();
    stack.push(items.iter());
    while let Some(cursor) = stack.last_mut() {
        match cursor.next() {
            None => {
                stack.pop();
            }
            Some(ParseItem::Value(value)) => return Some(value),
            Some(ParseItem::Ref(_)) => {}
            Some(ParseItem::Graph(graph)) => stack.push(graph.items.iter()),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use bgdata::{encoding::Encoding, value::Value};

    use super::*;
    use crate::shorthand::{con, def, seq};

    fn value(name: &str, byte: u8, offset: u64, token: &Arc<Token>) -> ParseItem {
        ParseItem::Value(ParseValue::new(
            name,
            Value::from_bytes(vec![byte], Encoding::default()),
            offset,
            Arc::clone(token),
        ))
    }

    fn bytes(values: &ImmutableList<ParseValue>) -> Vec<u8> {
        values.iter().map(byte).collect()
    }

    fn byte(value: &ParseValue) -> u8 {
        value.value().bytes().unwrap()[0]
    }

    #[test]
    fn values_come_out_in_production_order() {
        let field = def("v", con(1));
        let group = seq("group", [Arc::clone(&field)]);
        let graph = ParseGraph::new()
            .add(value("v", 1, 0, &field))
            .add_branch(Arc::clone(&group), 1)
            .add(value("group.v", 2, 1, &field))
            .add_branch(Arc::clone(&group), 2)
            .add(value("group.group.v", 3, 2, &field))
            .close_branch()
            .unwrap()
            .add(value("group.v", 4, 3, &field))
            .close_branch()
            .unwrap()
            .add(value("v", 5, 4, &field));

        assert_eq!(bytes(&graph.values()), vec![1, 2, 3, 4, 5]);
        assert_eq!(bytes(&graph.get_all("group.v")), vec![2, 3, 4]);
        assert_eq!(graph.graphs().len(), 2);
        assert_eq!(graph.items().len(), 3);
    }

    #[test]
    fn lookup_prefers_innermost_open_scope() {
        let field = def("v", con(1));
        let group = seq("group", [Arc::clone(&field)]);
        let graph = ParseGraph::new()
            .add(value("v", 1, 0, &field))
            .add(value("v", 2, 1, &field))
            .add_branch(Arc::clone(&group), 2)
            .add_branch(Arc::clone(&group), 2)
            .add(value("group.group.v", 3, 2, &field))
            .close_branch()
            .unwrap();

        // The closed inner scope is not entered: the outer value wins.
        assert_eq!(byte(&graph.get("v").unwrap()), 2);
        // But its newest value is still the current one.
        assert_eq!(byte(&graph.current().unwrap()), 3);

        let graph = graph.add(value("group.v", 4, 3, &field));
        assert_eq!(byte(&graph.get("v").unwrap()), 4);
        assert!(graph.get("missing").is_none());
        assert_eq!(byte(&graph.find("group.group.v").unwrap()), 3);
        assert!(graph.get("group.group.v").is_none());
    }

    #[test]
    fn values_since_checkpoint() {
        let field = def("v", con(1));
        let group = seq("group", [Arc::clone(&field)]);
        let checkpoint = ParseGraph::new().add(value("v", 1, 0, &field));
        let graph = checkpoint
            .add_branch(group, 1)
            .add(value("v", 2, 1, &field))
            .add(value("v", 3, 2, &field));

        assert_eq!(bytes(&graph.values_since(&checkpoint)), vec![2, 3]);
        assert!(graph.values_since(&graph).is_empty());
        assert!(graph.has_value_at(2));
        assert!(!graph.has_value_at(3));

        let closed = graph.close_branch().unwrap().add(value("v", 4, 3, &field));
        assert_eq!(bytes(&closed.values_since(&checkpoint)), vec![2, 3, 4]);
    }

    #[test]
    fn walks_stop_at_the_first_break() {
        let field = def("v", con(1));
        let graph = (0..100u8).fold(ParseGraph::new(), |graph, n| {
            graph.add(value("v", n, n as u64, &field))
        });

        let mut visited = 0;
        let found = graph.try_walk(|visit| {
            visited += 1;
            match visit {
                Visit::Value(value) if byte(value) == 97 => ControlFlow::Break(value.offset()),
                _ => ControlFlow::Continue(()),
            }
        });
        assert_eq!(found, Some(97));
        assert_eq!(visited, 3);

        let checkpoint = graph.clone();
        let graph = graph.add(value("w", 100, 100, &field));
        assert_eq!(bytes(&graph.values_since(&checkpoint)), vec![100]);
        assert_eq!(byte(&graph.find("v").unwrap()), 99);
        assert!(graph.has_value_at(99));
        assert!(!graph.has_value_at(101));
    }

    #[test]
    fn references_resolve_to_the_matching_scope() {
        let field = def("v", con(1));
        let group = seq("group", [Arc::clone(&field)]);
        let graph = ParseGraph::new()
            .add_branch(Arc::clone(&group), 7)
            .add(value("group.v", 1, 7, &field))
            .close_branch()
            .unwrap();

        let found = ParseReference::new(7, Arc::clone(&group)).resolve(&graph).unwrap();
        assert_eq!(found.offset(), 7);
        assert_eq!(found.value_count(), 1);

        let missing = ParseReference::new(8, Arc::clone(&group)).resolve(&graph);
        assert!(matches!(
            missing,
            Err(BgError::UnresolvedReference { offset: 8, .. })
        ));
        let wrong_token = ParseReference::new(7, field).resolve(&graph);
        assert!(wrong_token.is_err());
    }
}
