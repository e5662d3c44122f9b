// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

//! A plain doubly linked list with `O(1)` insertion and removal anywhere,
//! addressed through [`Handle`]s. It keeps no ordering of its own.

use std::{
    fmt,
    iter::FusedIterator,
};

/// Refers to a node of a [`DlList`]. Handles of removed nodes go stale: every
/// operation treats them as absent, even after their slot has been reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: usize,
    generation: u64,
}

#[derive(Clone)]
struct Entry<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Clone)]
struct Slot<T> {
    generation: u64,
    entry: Option<Entry<T>>,
}

#[derive(Clone)]
pub struct DlList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    first: Option<usize>,
    last: Option<usize>,
    len: usize,
}

impl<T> DlList<T> {
    pub fn new() -> Self {
        DlList {
            slots: Vec::new(),
            free: Vec::new(),
            first: None,
            last: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Option<Handle> {
        self.first.map(|index| self.handle(index))
    }

    pub fn last(&self) -> Option<Handle> {
        self.last.map(|index| self.handle(index))
    }

    /// Inserts `value` right before `before`, or at the end of the list when
    /// `before` is `None`. To insert at the start, pass [`DlList::first`].
    ///
    /// Gives `value` back if `before` is not a live node of this list.
    pub fn insert(&mut self, value: T, before: Option<Handle>) -> Result<Handle, T> {
        let (prev, next) = match before {
            | Some(handle) => match self.entry(handle) {
                | Some(entry) => (entry.prev, Some(handle.index)),
                | None => return Err(value),
            },
            | None => (self.last, None),
        };

        let entry = Entry { value, prev, next };
        let index = match self.free.pop() {
            | Some(index) => {
                self.slots[index].entry = Some(entry);
                index
            },
            | None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                self.slots.len() - 1
            },
        };

        match prev {
            | Some(p) => self.link_mut(p).next = Some(index),
            | None => self.first = Some(index),
        }
        match next {
            | Some(n) => self.link_mut(n).prev = Some(index),
            | None => self.last = Some(index),
        }
        self.len += 1;
        Ok(self.handle(index))
    }

    pub fn push_back(&mut self, value: T) -> Handle {
        match self.insert(value, None) {
            | Ok(handle) => handle,
            | Err(_) => unreachable!("appending never needs a live anchor"),
        }
    }

    /// Unlinks the node behind `handle` and returns its value. Removing a node
    /// that was already removed is a no-op.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.entry(handle)?;
        let slot = &mut self.slots[handle.index];
        let entry = slot.entry.take()?;
        slot.generation += 1;
        self.free.push(handle.index);

        match entry.prev {
            | Some(p) => self.link_mut(p).next = entry.next,
            | None => self.first = entry.next,
        }
        match entry.next {
            | Some(n) => self.link_mut(n).prev = entry.prev,
            | None => self.last = entry.prev,
        }
        self.len -= 1;
        Some(entry.value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.entry(handle).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.slots.get_mut(handle.index) {
            | Some(slot) if slot.generation == handle.generation => {
                slot.entry.as_mut().map(|entry| &mut entry.value)
            },
            | _ => None,
        }
    }

    /// The node after `handle`. Fetch it before removing `handle` to keep
    /// walking the list while removing nodes.
    pub fn next(&self, handle: Handle) -> Option<Handle> {
        let next = self.entry(handle)?.next?;
        Some(self.handle(next))
    }

    pub fn prev(&self, handle: Handle) -> Option<Handle> {
        let prev = self.entry(handle)?.prev?;
        Some(self.handle(prev))
    }

    /// Iterates over the nodes from first to last.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            next: self.first,
            remaining: self.len,
        }
    }

    fn handle(&self, index: usize) -> Handle {
        Handle {
            index,
            generation: self.slots[index].generation,
        }
    }

    fn entry(&self, handle: Handle) -> Option<&Entry<T>> {
        match self.slots.get(handle.index) {
            | Some(slot) if slot.generation == handle.generation => slot.entry.as_ref(),
            | _ => None,
        }
    }

    fn link(&self, index: usize) -> &Entry<T> {
        match &self.slots[index].entry {
            | Some(entry) => entry,
            | None => panic!("dangling link to slot {}", index),
        }
    }

    fn link_mut(&mut self, index: usize) -> &mut Entry<T> {
        match &mut self.slots[index].entry {
            | Some(entry) => entry,
            | None => panic!("dangling link to slot {}", index),
        }
    }
}

impl<T> Default for DlList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for DlList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(_, value)| value))
            .finish()
    }
}

impl<T> Extend<T> for DlList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for DlList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = DlList::new();
        list.extend(iter);
        list
    }
}

impl<'a, T> IntoIterator for &'a DlList<T> {
    type IntoIter = Iter<'a, T>;
    type Item = (Handle, &'a T);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct Iter<'a, T> {
    list: &'a DlList<T>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let entry = self.list.link(index);
        self.next = entry.next;
        self.remaining -= 1;
        Some((self.list.handle(index), &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

/// Walks `list` in both directions and panics if the links, the ends or the
/// length disagree.
pub fn check<T>(list: &DlList<T>) {
    let Some(first) = list.first else {
        assert!(list.last.is_none(), "empty list has a last node");
        assert_eq!(list.len, 0, "empty list has a length");
        return;
    };

    assert!(list.link(first).prev.is_none(), "first node has a predecessor");
    let mut node = first;
    let mut count = 1;
    while let Some(next) = list.link(node).next {
        assert_eq!(list.link(next).prev, Some(node), "broken back link at {}", count);
        node = next;
        count += 1;
    }
    assert_eq!(Some(node), list.last, "last node is not at the end");
    assert_eq!(count, list.len, "length does not match the node count");
    assert_eq!(
        list.slots.len() - list.free.len(),
        list.len,
        "unreachable nodes in the slots"
    );
}
