// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use std::f64::consts::E;

/// The maximum number of levels a skiplist can have. With
/// [`LEVEL_PROBABILITY`] this comfortably covers lists of several hundred
/// million entries before the top level gets crowded.
pub const MAX_LEVEL: usize = 20;

/// The chance that a node which reaches level `n` also reaches level `n + 1`.
/// `1/e` minimizes the expected number of comparisons per search.
pub const LEVEL_PROBABILITY: f64 = 1.0 / E;

/// The default size of a memtable is 1MiB of key and value payload.
pub const DEFAULT_MEMTABLE_CAPACITY: usize = 2 << 19;
