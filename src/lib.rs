// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

//! Ordered, position-addressable collections.
//!
//! The core is [`SkipList`], an ordered multimap that finds entries by key or
//! by rank in `O(log n)`. [`Memtable`] wraps it into a bounded, thread-safe
//! byte table, and [`DlList`] is a handle-addressed doubly linked list.

pub mod config;
pub mod dllist;
pub mod errs;
pub mod memtable;

/// An indexable [`skip list`].
///
/// [`skip list`]: https://en.wikipedia.org/wiki/Skip_list
pub mod skiplist;

pub use crate::{
    dllist::{
        DlList,
        Handle,
    },
    errs::{
        MemtableError,
        SkipListError,
    },
    memtable::{
        Memtable,
        MemtableIterator,
    },
    skiplist::{
        IntoIter,
        Iter,
        Keys,
        Range,
        SkipList,
        Values,
    },
};
