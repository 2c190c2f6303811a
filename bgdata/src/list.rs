//! Persistent, structurally shared singly-linked list.
//!
//! Pushing allocates one node pointing at the unchanged tail, so every
//! previously obtained list stays valid forever. Saving a list is cloning an
//! `Arc`; rewinding is dropping the newer reference.
//!
//! Long lists are safe to drop and to reverse: [`Drop`] unlinks nodes in a loop
//! and [`ImmutableList::reverse`] is driven by a [`Trampoline`].
use std::{fmt, sync::Arc};

use crate::trampoline::Trampoline;

struct Node<T> {
    value: T,
    tail: ImmutableList<T>,
}

/// Immutable cons list. The head is the most recently pushed element.
pub struct ImmutableList<T> {
    head: Option<Arc<Node<T>>>,
    len: usize,
}

impl<T> ImmutableList<T> {
    /// Create an empty list.
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Create a one-element list.
    pub fn single(value: T) -> Self {
        Self::new().push(value)
    }

    /// Return a new list with `value` prepended. `self` is left untouched.
    pub fn push(&self, value: T) -> Self {
        Self {
            head: Some(Arc::new(Node {
                value,
                tail: self.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Most recently pushed element.
    #[inline]
    pub fn head(&self) -> Option<&T> {
        self.head.as_ref().map(|node| &node.value)
    }

    /// The list without its head. The tail of an empty list is empty.
    pub fn tail(&self) -> Self {
        match &self.head {
            Some(node) => node.tail.clone(),
            None => Self::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Iterate from head to tail.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head.as_deref(),
            remaining: self.len,
        }
    }

    /// Returns true if both lists share the very same head node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Clone> ImmutableList<T> {
    /// Return the list in reverse order.
    ///
    /// Each step moves one element onto the accumulator and yields the next step
    /// as a value; the loop in [`Trampoline::run`] keeps the call stack flat no
    /// matter how long the list is.
    pub fn reverse(&self) -> Self {
        fn step<'a, T: Clone + 'a>(
            rest: ImmutableList<T>,
            acc: ImmutableList<T>,
        ) -> Trampoline<'a, ImmutableList<T>> {
            let Some(value) = rest.head().cloned() else {
                return Trampoline::Done(acc);
            };
            let acc = acc.push(value);
            let rest = rest.tail();
            Trampoline::more(move || step(rest, acc))
        }

        step(self.clone(), Self::new()).run()
    }
}

impl<T> Clone for ImmutableList<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for ImmutableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ImmutableList<T> {
    fn drop(&mut self) {
        // Unlink uniquely owned nodes one by one instead of letting the nested
        // `Arc` drops recurse down the whole chain.
        let mut next = self.head.take();
        while let Some(node) = next {
            match Arc::into_inner(node) {
                Some(mut node) => next = node.tail.head.take(),
                None => break,
            }
        }
    }
}

impl<T: PartialEq> PartialEq for ImmutableList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for ImmutableList<T> {}

impl<T: fmt::Debug> fmt::Debug for ImmutableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Builds a list whose iteration order equals the order of the input.
impl<T> FromIterator<T> for ImmutableList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(Self::new(), |list, item| list.push(item))
    }
}

/// Borrowing iterator over an [`ImmutableList`], head first.
pub struct Iter<'a, T> {
    next: Option<&'a Node<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.tail.head.as_deref();
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a ImmutableList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
