// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipListError {
    #[error("key not found")]
    NotFound,
    #[error("index {index} out of range for list of length {len}")]
    OutOfRange { index: isize, len: usize },
    #[error("list is empty")]
    Empty,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemtableError {
    #[error("memtable is frozen")]
    Frozen,
    #[error("data insertion would exceed maximum capacity ({size} > {capacity})")]
    DataExceedsMaximum { size: usize, capacity: usize },
    #[error(transparent)]
    SkipList(#[from] SkipListError),
}
