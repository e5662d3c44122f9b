// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use std::{
    mem,
    ops::{
        Index,
        IndexMut,
    },
};

/// A handle to a node owned by an [`Arena`]. Two reserved handles stand in
/// for the head and tail sentinels, which are never stored in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

impl NodeId {
    pub(crate) const HEAD: NodeId = NodeId(usize::MAX - 1);
    pub(crate) const TAIL: NodeId = NodeId(usize::MAX);
}

/// A single entry of the skiplist.
///
/// `forward[0]` is the base level successor and `forward.len()` is the level
/// of the node, fixed at creation. `skip` is only meaningful when the level is
/// greater than one: it counts the base level hops spanned by the topmost link
/// that arrives at this node, i.e. the distance from the node's predecessor on
/// its own top level.
#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) forward: Vec<NodeId>,
    pub(crate) skip: usize,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K, value: V, level: usize) -> Self {
        debug_assert!(level >= 1, "node level must be at least one");
        Node {
            key,
            value,
            forward: vec![NodeId::TAIL; level],
            skip: 0,
        }
    }

    #[inline]
    pub(crate) fn level(&self) -> usize {
        self.forward.len()
    }
}

#[derive(Clone, Debug)]
enum Slot<T> {
    Occupied(T),
    Vacant(Option<usize>),
}

/// Slot storage for nodes. Vacated slots are chained into a free list and
/// reused by later insertions, so handles stay small and stable for the
/// lifetime of a node.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    next_free: Option<usize>,
    len: usize,
}

impl<T> Arena<T> {
    pub(crate) fn new() -> Self {
        Arena {
            slots: Vec::new(),
            next_free: None,
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn insert(&mut self, value: T) -> NodeId {
        self.len += 1;
        match self.next_free {
            | Some(idx) => {
                let slot = mem::replace(&mut self.slots[idx], Slot::Occupied(value));
                self.next_free = match slot {
                    | Slot::Vacant(next) => next,
                    | Slot::Occupied(_) => unreachable!("free list points at an occupied slot"),
                };
                NodeId(idx)
            },
            | None => {
                self.slots.push(Slot::Occupied(value));
                NodeId(self.slots.len() - 1)
            },
        }
    }

    /// Removes the node behind `id` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a live node.
    pub(crate) fn remove(&mut self, id: NodeId) -> T {
        match mem::replace(&mut self.slots[id.0], Slot::Vacant(self.next_free)) {
            | Slot::Occupied(value) => {
                self.next_free = Some(id.0);
                self.len -= 1;
                value
            },
            | Slot::Vacant(next) => {
                self.slots[id.0] = Slot::Vacant(next);
                panic!("removing vacant node {:?}", id);
            },
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.0) {
            | Some(Slot::Occupied(value)) => Some(value),
            | _ => None,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.next_free = None;
        self.len = 0;
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    fn index(&self, id: NodeId) -> &T {
        match self.slots.get(id.0) {
            | Some(Slot::Occupied(value)) => value,
            | _ => panic!("dangling link to node {:?}", id),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.slots.get_mut(id.0) {
            | Some(Slot::Occupied(value)) => value,
            | _ => panic!("dangling link to node {:?}", id),
        }
    }
}
