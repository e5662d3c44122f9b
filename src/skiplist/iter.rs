// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use std::iter::FusedIterator;

use crate::skiplist::{
    node::NodeId,
    raw::RawSkipList,
};

/// An iterator over all pairs of a [`SkipList`](crate::SkipList).
pub type Iter<'a, K, V> = Range<'a, K, V>;

/// An iterator over a run of consecutive pairs of a
/// [`SkipList`](crate::SkipList).
///
/// Both ends are resolved when the iterator is created, so its length is
/// known up front. Cloning the iterator restarts from the clone's position.
pub struct Range<'a, K, V> {
    raw: &'a RawSkipList<K, V>,
    next: NodeId,
    remaining: usize,
}

impl<'a, K, V> Range<'a, K, V> {
    pub(crate) fn new(raw: &'a RawSkipList<K, V>, next: NodeId, remaining: usize) -> Self {
        Range {
            raw,
            next,
            remaining,
        }
    }

    /// Only yield the keys.
    pub fn keys(self) -> Keys<'a, K, V> {
        Keys { inner: self }
    }

    /// Only yield the values.
    pub fn values(self) -> Values<'a, K, V> {
        Values { inner: self }
    }
}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Range {
            raw: self.raw,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Range<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.next == NodeId::TAIL {
            return None;
        }
        let node = &self.raw.nodes[self.next];
        self.next = node.forward[0];
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Range<'_, K, V> {}

impl<K, V> FusedIterator for Range<'_, K, V> {}

pub struct Keys<'a, K, V> {
    inner: Range<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

pub struct Values<'a, K, V> {
    inner: Range<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// An owning iterator over the pairs of a [`SkipList`](crate::SkipList), in
/// order.
pub struct IntoIter<K, V> {
    raw: RawSkipList<K, V>,
    next: NodeId,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(raw: RawSkipList<K, V>, remaining: usize) -> Self {
        let next = raw.head[0];
        IntoIter {
            raw,
            next,
            remaining,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == NodeId::TAIL {
            return None;
        }
        // the links are never followed again, so the slots can go one by one
        let node = self.raw.nodes.remove(self.next);
        self.next = node.forward[0];
        self.remaining -= 1;
        Some((node.key, node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}
