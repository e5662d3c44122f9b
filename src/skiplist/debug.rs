// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

//! Structural diagnostics for [`SkipList`]. None of this is needed to use the
//! list; it exists to verify the link structure and skip counts in tests and
//! to inspect the shape of a list while debugging.

use std::{
    fmt::Debug,
    io,
    io::Write,
};

use getset::{
    CopyGetters,
    Getters,
};

use crate::{
    config::MAX_LEVEL,
    skiplist::{
        node::NodeId,
        SkipList,
    },
};

/// A summary of the shape of a skiplist.
#[derive(Debug, Clone, PartialEq, CopyGetters, Getters)]
pub struct SkipListStats {
    #[getset(get_copy = "pub")]
    len: usize,
    #[getset(get_copy = "pub")]
    level: usize,
    #[getset(get_copy = "pub")]
    max_level: usize,
    /// `nodes_per_level[i]` is the number of nodes that take part in level
    /// `i`.
    #[getset(get = "pub")]
    nodes_per_level: Vec<usize>,
    #[getset(get_copy = "pub")]
    avg_level: f64,
}

/// Walks the whole list and panics if any structural invariant is broken:
///
/// - the base level is sorted and every level is a sorted sub-chain of it,
/// - no node reaches above the active level and the active level is in use,
/// - every skip count equals the base level distance it stands for,
/// - the length computed from the top level equals the number of nodes,
/// - every node in the arena is reachable.
///
/// A failure here means the mutation logic is broken, not that the caller
/// misused the list.
pub fn check<K: Ord, V>(list: &SkipList<K, V>) {
    let raw = &list.raw;
    let level = raw.level;
    assert!(
        (1..=MAX_LEVEL).contains(&level),
        "active level {} out of bounds",
        level
    );
    assert!(
        level == 1 || raw.head[level - 1] != NodeId::TAIL,
        "top level {} is empty",
        level
    );
    for i in level..MAX_LEVEL {
        assert_eq!(raw.head[i], NodeId::TAIL, "head reaches inactive level {}", i);
    }

    // the last node seen on every level and its base level position; the head
    // sits at position 0 and the n-th node at position n
    let mut last = [(NodeId::HEAD, 0usize); MAX_LEVEL];
    let mut pos = 0;
    let mut prev_key: Option<&K> = None;
    let mut node = raw.head[0];
    while node != NodeId::TAIL {
        pos += 1;
        let n = raw
            .nodes
            .get(node)
            .unwrap_or_else(|| panic!("dangling link to {:?} at position {}", node, pos));
        let node_level = n.level();
        assert!(
            (1..=level).contains(&node_level),
            "node at position {} has level {} above active level {}",
            pos,
            node_level,
            level
        );
        if let Some(prev) = prev_key {
            assert!(prev <= &n.key, "keys out of order at position {}", pos);
        }

        for (i, (pred, _)) in last.iter().enumerate().take(node_level) {
            assert_eq!(
                raw.next(*pred, i),
                node,
                "level {} skips the node at position {}",
                i,
                pos
            );
        }
        if node_level > 1 {
            let (_, pred_pos) = last[node_level - 1];
            assert_eq!(
                n.skip,
                pos - pred_pos,
                "wrong skip count on node at position {}",
                pos
            );
        }
        for entry in last.iter_mut().take(node_level) {
            *entry = (node, pos);
        }

        prev_key = Some(&n.key);
        node = n.forward[0];
    }

    for (i, (pred, _)) in last.iter().enumerate().take(level) {
        assert_eq!(raw.next(*pred, i), NodeId::TAIL, "level {} does not end at the tail", i);
    }
    let expected_tail_skip = if level == 1 {
        0
    } else {
        pos - last[level - 1].1
    };
    assert_eq!(raw.tail_skip, expected_tail_skip, "wrong tail skip count");
    assert_eq!(list.len(), pos, "length does not match the node count");
    assert_eq!(raw.nodes.len(), pos, "unreachable nodes in the arena");
}

/// Writes a human readable dump of `list` to `out`, one line per node.
pub fn dump<K, V, W>(list: &SkipList<K, V>, out: &mut W) -> io::Result<()>
where
    K: Debug,
    V: Debug,
    W: Write,
{
    let raw = &list.raw;
    writeln!(out, "== Dumping skiplist")?;
    writeln!(out, "Level: {}/{}", raw.level, list.max_level())?;
    writeln!(out, "Size: {}", list.len())?;
    writeln!(out, "<head> (level={})", MAX_LEVEL)?;

    let mut node = raw.head[0];
    while node != NodeId::TAIL {
        let n = &raw.nodes[node];
        if n.level() > 1 {
            writeln!(
                out,
                "<node level={} key={:?} value={:?} skip={}>",
                n.level(),
                n.key,
                n.value,
                n.skip
            )?;
        } else {
            writeln!(out, "<node level=1 key={:?} value={:?}>", n.key, n.value)?;
        }
        node = n.forward[0];
    }
    writeln!(out, "<tail> (skip={})", raw.tail_skip)?;

    let stats = stats(list);
    writeln!(out, "Avg level: {:.2}", stats.avg_level())?;
    Ok(())
}

/// Collects a [`SkipListStats`] for `list`.
pub fn stats<K, V>(list: &SkipList<K, V>) -> SkipListStats {
    let raw = &list.raw;
    let mut nodes_per_level = vec![0; raw.level];
    let mut total_levels = 0;
    let mut len = 0;

    let mut node = raw.head[0];
    while node != NodeId::TAIL {
        let n = &raw.nodes[node];
        for count in nodes_per_level.iter_mut().take(n.level()) {
            *count += 1;
        }
        total_levels += n.level();
        len += 1;
        node = n.forward[0];
    }

    SkipListStats {
        len,
        level: raw.level,
        max_level: list.max_level(),
        nodes_per_level,
        avg_level: if len == 0 {
            0.0
        } else {
            total_levels as f64 / len as f64
        },
    }
}
