// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

//! An indexable skiplist: an ordered multimap which is as fast at finding the
//! n-th entry as it is at finding a key.
//!
//! SkipLists use a probabilistic distribution of nodes over the internal
//! levels, whereby the lowest level (level 0) contains all the nodes, and each
//! level `n > 0` will contain a random subset of the nodes on level `n - 1`.
//! A geometric distribution is used whereby the chance that a node occupies
//! level `n` is `p` times the chance of occupying level `n-1`.
//!
//! ```text
//! <head> ----------> [2] ----------------------------------------------------> <tail>
//! <head> ----------> [2] ------------------------------> [7] ----------------> <tail>
//! <head> --> [1] --> [2] --> [3] --> [4] --> [5] --> [6] --> [7] --> [8] --> <tail>
//! ```
//!
//! Every node whose level is greater than one records how many base level
//! hops its topmost incoming link covers (`[2]` above: 2, `[7]`: 5). The tail
//! keeps the same count for the top level (6), so the length is the sum of
//! the counts along the top level. A search sums those counts on its way
//! down, which gives the rank of every node it passes, so lookups by position
//! cost `O(log n)` just like lookups by key.
//!
//! The list is not internally synchronized. Wrap it in a lock (see
//! [`Memtable`](crate::memtable::Memtable)) to share it between threads.

use std::{
    borrow::Borrow,
    fmt,
    ops::{
        Bound,
        RangeBounds,
    },
};

use tracing::debug;

pub use crate::skiplist::iter::{
    IntoIter,
    Iter,
    Keys,
    Range,
    Values,
};
use crate::{
    config::{
        LEVEL_PROBABILITY,
        MAX_LEVEL,
    },
    errs::SkipListError,
    skiplist::{
        level_generator::{
            GeometricalLevelGenerator,
            LevelGenerator,
        },
        node::{
            Node,
            NodeId,
        },
        raw::{
            Path,
            RawSkipList,
        },
    },
};

pub mod debug;
mod iter;
mod level_generator;
mod node;
mod raw;
#[cfg(test)]
mod tests;

/// An ordered sequence of key-value pairs, sorted on key, with `O(log n)`
/// insertion, removal and lookup both by key and by position.
///
/// Duplicate keys are allowed. A new pair is always placed after the pairs
/// already present with the same key, and every by-key operation acts on the
/// first (leftmost) pair with that key.
///
/// ```
/// use cesium_skiplist::SkipList;
///
/// let mut list = SkipList::new();
/// list.insert(5, "a");
/// list.insert(3, "b");
/// list.insert(5, "c");
///
/// assert_eq!(list.rank_of(&5), Ok(1));
/// assert_eq!(list.get_at(-1), Ok((&5, &"c")));
/// assert_eq!(list.count_of(&5), 2);
/// ```
#[derive(Clone)]
pub struct SkipList<K, V> {
    raw: RawSkipList<K, V>,
    // scratch space for the path of the mutation in progress
    path: Path,
    level_generator: GeometricalLevelGenerator,
}

impl<K, V> SkipList<K, V> {
    pub fn new() -> Self {
        Self::with_level_generator(GeometricalLevelGenerator::new(MAX_LEVEL, LEVEL_PROBABILITY))
    }

    /// Creates a list whose node levels are drawn from a generator seeded with
    /// `seed`, so the shape of the list is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_level_generator(GeometricalLevelGenerator::with_seed(
            MAX_LEVEL,
            LEVEL_PROBABILITY,
            seed,
        ))
    }

    fn with_level_generator(level_generator: GeometricalLevelGenerator) -> Self {
        SkipList {
            raw: RawSkipList::new(),
            path: Path::default(),
            level_generator,
        }
    }

    /// The number of pairs in the list.
    ///
    /// This is computed from the skip counts on the top level, so it only
    /// touches the few nodes that reach that level.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.head[0] == NodeId::TAIL
    }

    /// The number of levels currently in use.
    pub fn level(&self) -> usize {
        self.raw.level
    }

    /// The maximum number of levels the list can grow to.
    pub fn max_level(&self) -> usize {
        self.level_generator.total()
    }

    /// Removes all pairs.
    pub fn clear(&mut self) {
        let len = self.raw.nodes.len();
        self.raw.clear();
        debug!(len, "skiplist cleared");
    }

    /// The first pair of the list, if any.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.entry(self.raw.head[0])
    }

    /// Returns the pair at position `rank`. A negative rank counts from the
    /// end, so `-1` is the last pair.
    pub fn get_at(&self, rank: isize) -> Result<(&K, &V), SkipListError> {
        let rank = self.resolve(rank)?;
        let mut path = Path::default();
        self.raw.find_rank(&mut path, rank);
        let id = self.raw.next(path.nodes[0], 0);
        let node = &self.raw.nodes[id];
        Ok((&node.key, &node.value))
    }

    /// Replaces the value at position `rank`, returning the previous one.
    pub fn set_value_at(&mut self, rank: isize, value: V) -> Result<V, SkipListError> {
        let rank = self.resolve(rank)?;
        self.raw.find_rank(&mut self.path, rank);
        let id = self.raw.next(self.path.nodes[0], 0);
        Ok(std::mem::replace(&mut self.raw.nodes[id].value, value))
    }

    /// Removes and returns the pair at position `rank`.
    pub fn remove_at(&mut self, rank: isize) -> Result<(K, V), SkipListError> {
        let rank = self.resolve(rank)?;
        self.raw.find_rank(&mut self.path, rank);
        let id = self.raw.next(self.path.nodes[0], 0);
        Ok(self.raw.unlink(&self.path, id))
    }

    /// Removes and returns the first pair.
    pub fn pop_front(&mut self) -> Result<(K, V), SkipListError> {
        let id = self.raw.head[0];
        if id == NodeId::TAIL {
            return Err(SkipListError::Empty);
        }
        self.raw.find_rank(&mut self.path, 0);
        Ok(self.raw.unlink(&self.path, id))
    }

    /// Iterates over all pairs in order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Range::new(&self.raw, self.raw.head[0], self.len())
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        self.iter().keys()
    }

    pub fn values(&self) -> Values<'_, K, V> {
        self.iter().values()
    }

    /// Iterates over the pairs at the positions in `range`. Negative
    /// positions count from the end, like [`SkipList::get_at`], and both ends
    /// are clamped to the list, so out of range bounds never fail.
    ///
    /// ```
    /// use cesium_skiplist::SkipList;
    ///
    /// let list: SkipList<_, _> = (0..10).map(|i| (i, i * i)).collect();
    /// let squares: Vec<_> = list.range_at(7..).values().copied().collect();
    /// assert_eq!(squares, vec![49, 64, 81]);
    /// let squares: Vec<_> = list.range_at(-3..-1).values().copied().collect();
    /// assert_eq!(squares, vec![49, 64]);
    /// ```
    pub fn range_at<R>(&self, range: R) -> Range<'_, K, V>
    where
        R: RangeBounds<isize>,
    {
        let len = self.len();
        let resolve = |rank: isize| {
            if rank < 0 {
                rank.saturating_add_unsigned(len)
            } else {
                rank
            }
        };
        let start = match range.start_bound() {
            | Bound::Included(&start) => resolve(start),
            | Bound::Excluded(&start) => resolve(start).saturating_add(1),
            | Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            | Bound::Included(&end) => resolve(end).saturating_add(1),
            | Bound::Excluded(&end) => resolve(end),
            | Bound::Unbounded => isize::MAX,
        };
        // a list never holds more than isize::MAX nodes
        let start = start.clamp(0, len as isize) as usize;
        let end = end.clamp(0, len as isize) as usize;
        if start >= end {
            return Range::new(&self.raw, NodeId::TAIL, 0);
        }

        let mut path = Path::default();
        self.raw.find_rank(&mut path, start);
        Range::new(&self.raw, self.raw.next(path.nodes[0], 0), end - start)
    }

    fn entry(&self, id: NodeId) -> Option<(&K, &V)> {
        if id == NodeId::TAIL {
            return None;
        }
        let node = &self.raw.nodes[id];
        Some((&node.key, &node.value))
    }

    fn resolve(&self, rank: isize) -> Result<usize, SkipListError> {
        let len = self.len();
        let resolved = if rank < 0 {
            rank.checked_add_unsigned(len)
        } else {
            Some(rank)
        };
        match resolved {
            | Some(idx) if idx >= 0 && (idx as usize) < len => Ok(idx as usize),
            | _ => Err(SkipListError::OutOfRange { index: rank, len }),
        }
    }

    /// Creates a node for `key` and `value` and links it in at `self.path`,
    /// which must lead to the insertion point.
    fn insert_at_path(&mut self, key: K, value: V) {
        // a single insertion can raise the level by at most one
        let level = self.level_generator.random(self.raw.level + 1);
        self.raw.grow(&mut self.path, level);
        self.raw.link(&self.path, Node::new(key, value, level));
    }
}

impl<K: Ord, V> SkipList<K, V> {
    /// Inserts a pair. If pairs with the same key exist, the new pair is
    /// placed after all of them.
    pub fn insert(&mut self, key: K, value: V) {
        self.raw.find_le(&mut self.path, &key);
        self.insert_at_path(key, value);
    }

    /// Replaces the value of the first pair with key `key`, or inserts the
    /// pair if the key is absent.
    pub fn replace_first(&mut self, key: K, value: V) {
        self.raw.find_lt(&mut self.path, &key);
        let id = self.raw.next(self.path.nodes[0], 0);
        if self.raw.matches(id, &key) {
            self.raw.nodes[id].value = value;
        } else {
            self.insert_at_path(key, value);
        }
    }

    /// The value of the first pair with key `key`.
    pub fn search_first<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (id, _) = self.locate(key)?;
        Some(&self.raw.nodes[id].value)
    }

    /// Like [`SkipList::search_first`], falling back to `default`.
    pub fn search_first_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search_first(key).unwrap_or(default)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key).is_some()
    }

    /// Removes the first pair with key `key`.
    pub fn remove_first<Q>(&mut self, key: &Q) -> Result<(), SkipListError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.pop_first(key).map(|_| ())
    }

    /// Removes the first pair with key `key` and returns its value.
    pub fn pop_first<Q>(&mut self, key: &Q) -> Result<V, SkipListError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.raw.find_lt(&mut self.path, key);
        let id = self.raw.next(self.path.nodes[0], 0);
        if !self.raw.matches(id, key) {
            return Err(SkipListError::NotFound);
        }
        let (_, value) = self.raw.unlink(&self.path, id);
        Ok(value)
    }

    /// Like [`SkipList::pop_first`], returning `default` if the key is
    /// absent.
    pub fn pop_first_or<Q>(&mut self, key: &Q, default: V) -> V
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.pop_first(key).unwrap_or(default)
    }

    /// The position of the first pair with key `key`.
    pub fn rank_of<Q>(&self, key: &Q) -> Result<usize, SkipListError>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.locate(key)
            .map(|(_, rank)| rank)
            .ok_or(SkipListError::NotFound)
    }

    pub fn rank_of_or<Q>(&self, key: &Q, default: usize) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.rank_of(key).unwrap_or(default)
    }

    /// The number of pairs with key `key`.
    pub fn count_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let Some((mut id, _)) = self.locate(key) else {
            return 0;
        };
        let mut count = 0;
        while self.raw.matches(id, key) {
            count += 1;
            id = self.raw.nodes[id].forward[0];
        }
        count
    }

    /// Iterates over the pairs whose keys fall in `range`.
    ///
    /// ```
    /// use cesium_skiplist::SkipList;
    ///
    /// let list: SkipList<_, _> = [(1, 'a'), (3, 'b'), (5, 'c'), (7, 'd')].into_iter().collect();
    /// let pairs: Vec<_> = list.range(3..7).collect();
    /// assert_eq!(pairs, vec![(&3, &'b'), (&5, &'c')]);
    /// ```
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
        R: RangeBounds<Q>,
    {
        let mut path = Path::default();
        let start = match range.start_bound() {
            | Bound::Included(start) => {
                self.raw.find_lt(&mut path, start);
                path.nodes[0]
            },
            | Bound::Excluded(start) => {
                self.raw.find_le(&mut path, start);
                path.nodes[0]
            },
            | Bound::Unbounded => NodeId::HEAD,
        };
        let start_rank = path.rank();

        let end_rank = match range.end_bound() {
            | Bound::Included(end) => {
                self.raw.find_le(&mut path, end);
                path.rank()
            },
            | Bound::Excluded(end) => {
                self.raw.find_lt(&mut path, end);
                path.rank()
            },
            | Bound::Unbounded => self.len(),
        };

        Range::new(
            &self.raw,
            self.raw.next(start, 0),
            end_rank.saturating_sub(start_rank),
        )
    }

    /// The first node with key `key` and its rank.
    fn locate<Q>(&self, key: &Q) -> Option<(NodeId, usize)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut path = Path::default();
        self.raw.find_lt(&mut path, key);
        let id = self.raw.next(path.nodes[0], 0);
        self.raw.matches(id, key).then_some((id, path.rank()))
    }
}

impl<K, V> Default for SkipList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for SkipList<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for SkipList<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for SkipList<K, V> {}

impl<K: Ord, V> Extend<(K, V)> for SkipList<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for SkipList<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = SkipList::new();
        list.extend(iter);
        list
    }
}

impl<'a, K, V> IntoIterator for &'a SkipList<K, V> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for SkipList<K, V> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        let len = self.len();
        IntoIter::new(self.raw, len)
    }
}
