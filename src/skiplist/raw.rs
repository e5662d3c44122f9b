// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use std::borrow::Borrow;

use tracing::trace;

use crate::{
    config::MAX_LEVEL,
    skiplist::node::{
        Arena,
        Node,
        NodeId,
    },
};

/// The result of a path search: for every active level, the last node before
/// the target and the number of base level hops from the head to that node.
///
/// `distance[0]` is therefore the rank of the target, and the target itself
/// is the base level successor of `nodes[0]`.
#[derive(Clone, Debug)]
pub(crate) struct Path {
    pub(crate) nodes: [NodeId; MAX_LEVEL],
    pub(crate) distance: [usize; MAX_LEVEL],
}

impl Default for Path {
    fn default() -> Self {
        Path {
            nodes: [NodeId::HEAD; MAX_LEVEL],
            distance: [0; MAX_LEVEL],
        }
    }
}

impl Path {
    #[inline]
    pub(crate) fn rank(&self) -> usize {
        self.distance[0]
    }
}

/// The link structure of a skiplist without any of the map semantics.
///
/// The head sentinel is represented by `head`, its forward links. The tail
/// sentinel only exists as [`NodeId::TAIL`] plus `tail_skip`, the skip count
/// of the topmost link arriving at the tail. Together with the skip counts of
/// the nodes on the top level it gives the number of entries.
#[derive(Clone, Debug)]
pub(crate) struct RawSkipList<K, V> {
    pub(crate) nodes: Arena<Node<K, V>>,
    pub(crate) head: [NodeId; MAX_LEVEL],
    pub(crate) tail_skip: usize,
    pub(crate) level: usize,
}

impl<K, V> RawSkipList<K, V> {
    pub(crate) fn new() -> Self {
        RawSkipList {
            nodes: Arena::new(),
            head: [NodeId::TAIL; MAX_LEVEL],
            tail_skip: 0,
            level: 1,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.head = [NodeId::TAIL; MAX_LEVEL];
        self.tail_skip = 0;
        self.level = 1;
    }

    #[inline]
    pub(crate) fn next(&self, id: NodeId, level: usize) -> NodeId {
        if id == NodeId::HEAD {
            self.head[level]
        } else {
            self.nodes[id].forward[level]
        }
    }

    #[inline]
    fn set_next(&mut self, id: NodeId, level: usize, to: NodeId) {
        if id == NodeId::HEAD {
            self.head[level] = to;
        } else {
            self.nodes[id].forward[level] = to;
        }
    }

    /// The number of levels `id` takes part in. The tail reaches every active
    /// level.
    #[inline]
    pub(crate) fn reach(&self, id: NodeId) -> usize {
        if id == NodeId::TAIL {
            self.level
        } else {
            self.nodes[id].level()
        }
    }

    /// The base level hops covered by following a link on `level` that
    /// arrives at `id`. Only valid when `level` is the top level of `id`,
    /// which every link followed by a path search is.
    #[inline]
    fn hop(&self, id: NodeId, level: usize) -> usize {
        if level == 0 {
            1
        } else if id == NodeId::TAIL {
            self.tail_skip
        } else {
            self.nodes[id].skip
        }
    }

    #[inline]
    fn skip_mut(&mut self, id: NodeId) -> &mut usize {
        if id == NodeId::TAIL {
            &mut self.tail_skip
        } else {
            &mut self.nodes[id].skip
        }
    }

    /// Returns `true` if `id` is a live node whose key equals `key`.
    #[inline]
    pub(crate) fn matches<Q>(&self, id: NodeId, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        id != NodeId::TAIL && self.nodes[id].key.borrow() == key
    }

    /// The number of entries, summed from the skip counts along the top
    /// level. On a single level list there are no skip counts and every hop
    /// counts as one.
    pub(crate) fn len(&self) -> usize {
        let top = self.level - 1;
        let mut size = self.tail_skip;
        let mut node = self.head[top];
        while node != NodeId::TAIL {
            size += self.hop(node, top);
            node = self.nodes[node].forward[top];
        }
        size
    }

    /// Walks from the highest active level down to the base level, moving
    /// forward as long as `advance` accepts the next node and the distance it
    /// would be reached at.
    fn walk<F>(&self, path: &mut Path, mut advance: F)
    where
        F: FnMut(&Node<K, V>, usize) -> bool,
    {
        let mut node = NodeId::HEAD;
        let mut distance = 0;
        for i in (0..self.level).rev() {
            let mut next = self.next(node, i);
            while next != NodeId::TAIL {
                let next_distance = distance + self.hop(next, i);
                if !advance(&self.nodes[next], next_distance) {
                    break;
                }
                node = next;
                distance = next_distance;
                next = self.next(node, i);
            }
            path.nodes[i] = node;
            path.distance[i] = distance;
        }
    }

    /// Path to the last node with a key strictly less than `key`.
    pub(crate) fn find_lt<Q>(&self, path: &mut Path, key: &Q)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.walk(path, |node, _| node.key.borrow() < key)
    }

    /// Path to the last node with a key less than or equal to `key`.
    pub(crate) fn find_le<Q>(&self, path: &mut Path, key: &Q)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.walk(path, |node, _| node.key.borrow() <= key)
    }

    /// Path to the node right before rank `rank`.
    pub(crate) fn find_rank(&self, path: &mut Path, rank: usize) {
        self.walk(path, |_, distance| distance <= rank)
    }

    /// Raises the active level to `level` if needed, seeding the new top
    /// level of `path` from the head. `level` never exceeds the active level
    /// by more than one.
    pub(crate) fn grow(&mut self, path: &mut Path, level: usize) {
        if level <= self.level {
            return;
        }
        debug_assert_eq!(level, self.level + 1, "level may only grow one at a time");

        // the tail's new top link comes straight from the head
        self.tail_skip = self.len();
        self.level = level;
        path.nodes[level - 1] = NodeId::HEAD;
        path.distance[level - 1] = 0;
        trace!(level, len = self.tail_skip, "skiplist level raised");
    }

    /// Links `node` in after the nodes recorded in `path` and repairs the
    /// skip counts it disturbs.
    pub(crate) fn link(&mut self, path: &Path, node: Node<K, V>) -> NodeId {
        let level = node.level();
        debug_assert!(level <= self.level, "grow the list before linking");

        let id = self.nodes.insert(node);
        for i in 0..level {
            let next = self.next(path.nodes[i], i);
            self.nodes[id].forward[i] = next;
            self.set_next(path.nodes[i], i, id);
        }
        if level > 1 {
            self.nodes[id].skip = 1 + path.distance[0] - path.distance[level - 1];
        }

        let rank = path.distance[0];
        let first = self.nodes[id].forward[0];
        self.repair(first, |skip, reach| {
            if reach <= level {
                // the new node is now its predecessor on that level
                *skip -= rank - path.distance[reach - 1];
            } else {
                *skip += 1;
            }
        });
        id
    }

    /// Unlinks `id`, whose predecessors are recorded in `path`, repairs the
    /// skip counts and drops any levels left empty.
    pub(crate) fn unlink(&mut self, path: &Path, id: NodeId) -> (K, V) {
        let node = self.nodes.remove(id);
        let level = node.level();
        for i in 0..level {
            self.set_next(path.nodes[i], i, node.forward[i]);
        }

        let rank = path.distance[0];
        self.repair(node.forward[0], |skip, reach| {
            if reach <= level {
                // the removed node's predecessor takes over the link
                *skip += rank - path.distance[reach - 1];
            } else {
                *skip -= 1;
            }
        });
        self.shrink();

        (node.key, node.value)
    }

    /// Visits, for every level band above the base level, the first node at
    /// or after `from` whose topmost link crosses that band, and lets `adjust`
    /// fix its skip count. A node reaching several bands is visited once.
    fn repair<F>(&mut self, from: NodeId, mut adjust: F)
    where
        F: FnMut(&mut usize, usize),
    {
        let mut node = from;
        let mut reach = self.reach(node);
        let mut band = 2;
        while band <= self.level {
            while reach < band {
                node = self.next(node, band - 2);
                reach = self.reach(node);
            }
            adjust(self.skip_mut(node), reach);
            band = reach + 1;
        }
    }

    fn shrink(&mut self) {
        while self.level > 1 && self.head[self.level - 1] == NodeId::TAIL {
            // nothing reaches the top level, so the tail's link there spans
            // the whole list
            let size = self.tail_skip;
            self.level -= 1;
            self.tail_skip = 0;
            self.tail_skip = size - self.len();
            trace!(level = self.level, len = size, "skiplist level lowered");
        }
    }
}
