// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

use std::{
    collections::{
        Bound,
        HashMap,
    },
    sync::atomic::{
        AtomicBool,
        AtomicUsize,
        Ordering::Relaxed,
    },
    vec,
};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{
    debug,
    instrument,
};

use crate::{
    config::DEFAULT_MEMTABLE_CAPACITY,
    errs::MemtableError,
    skiplist::SkipList,
};

/// A bounded, thread-safe table of unique byte keys held in a [`SkipList`].
///
/// Writers are serialized behind a single lock. Once frozen, the table only
/// serves reads.
#[derive(Debug)]
pub struct Memtable {
    id: usize,
    map: Mutex<SkipList<Bytes, Bytes>>,
    approx_size: AtomicUsize,
    capacity: usize,
    frozen: AtomicBool,
}

impl Memtable {
    pub fn new(id: usize) -> Self {
        Self::with_capacity(id, DEFAULT_MEMTABLE_CAPACITY)
    }

    pub fn with_capacity(id: usize, capacity: usize) -> Self {
        Memtable {
            id,
            map: Mutex::new(SkipList::new()),
            approx_size: AtomicUsize::new(0),
            capacity,
            frozen: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The bytes of key and value payload currently held.
    pub fn size(&self) -> usize {
        self.approx_size.load(Relaxed)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }

    /// Stops accepting writes. Freezing is permanent, and no write is applied
    /// after this returns.
    #[instrument(level = "debug", skip(self), fields(id = self.id))]
    pub fn freeze(&self) {
        // writers check the flag under the same lock
        let map = self.map.lock();
        if !self.frozen.swap(true, Relaxed) {
            debug!(size = self.size(), len = map.len(), "memtable frozen");
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Relaxed)
    }

    #[instrument(level = "debug", skip(self, key), fields(id = self.id))]
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.map.lock().search_first(key).cloned()
    }

    /// The position of `key` among all keys of the table.
    #[instrument(level = "debug", skip(self, key), fields(id = self.id))]
    pub fn rank_of(&self, key: &[u8]) -> Option<usize> {
        self.map.lock().rank_of(key).ok()
    }

    /// The pair at `rank`. Negative ranks count from the end.
    #[instrument(level = "debug", skip(self), fields(id = self.id))]
    pub fn get_at(&self, rank: isize) -> Result<(Bytes, Bytes), MemtableError> {
        let map = self.map.lock();
        let (key, val) = map.get_at(rank)?;
        Ok((key.clone(), val.clone()))
    }

    /// Inserts or replaces a pair.
    #[instrument(level = "debug", skip(self, key, val), fields(id = self.id))]
    pub fn put(&self, key: Bytes, val: Bytes) -> Result<(), MemtableError> {
        self.put_batch(&[(key, val)])
    }

    /// Puts a batch of pairs into the memtable. The whole batch is checked
    /// against the capacity before anything is written, so a failed batch
    /// leaves the table untouched.
    #[instrument(level = "debug", skip(self, data), fields(id = self.id, count = data.len()))]
    pub fn put_batch(&self, data: &[(Bytes, Bytes)]) -> Result<(), MemtableError> {
        let mut map = self.map.lock();
        if self.is_frozen() {
            return Err(MemtableError::Frozen);
        }

        // replaced values give their bytes back, so only the net growth counts.
        // `pending` tracks keys written earlier in the same batch.
        let mut pending: HashMap<&[u8], usize> = HashMap::with_capacity(data.len());
        let mut added = 0;
        let mut released = 0;
        for (key, val) in data.iter() {
            let old = match pending.get(&key[..]) {
                | Some(len) => Some(*len),
                | None => map.search_first(&key[..]).map(Bytes::len),
            };
            match old {
                | Some(len) => {
                    released += len;
                    added += val.len();
                },
                | None => added += key.len() + val.len(),
            }
            pending.insert(&key[..], val.len());
        }

        let current = self.size();
        let size = (current + added).saturating_sub(released);
        if size > self.capacity && size > current {
            return Err(MemtableError::DataExceedsMaximum {
                size,
                capacity: self.capacity,
            });
        }

        for (key, val) in data.iter() {
            map.replace_first(key.clone(), val.clone());
        }
        self.approx_size.store(size, Relaxed);

        Ok(())
    }

    /// Removes `key` and returns its value.
    #[instrument(level = "debug", skip(self, key), fields(id = self.id))]
    pub fn delete(&self, key: &[u8]) -> Result<Option<Bytes>, MemtableError> {
        let mut map = self.map.lock();
        if self.is_frozen() {
            return Err(MemtableError::Frozen);
        }

        let removed = map.pop_first(key).ok();
        if let Some(val) = &removed {
            self.approx_size.fetch_sub(key.len() + val.len(), Relaxed);
        }
        Ok(removed)
    }

    /// Copies out the pairs whose keys fall between `lower` and `upper`. Later
    /// writes are not visible to the returned iterator.
    #[instrument(level = "debug", skip(self), fields(id = self.id))]
    pub fn scan(&self, lower: Bound<Bytes>, upper: Bound<Bytes>) -> MemtableIterator {
        let map = self.map.lock();
        let snapshot: Vec<(Bytes, Bytes)> = map
            .range((lower, upper))
            .map(|(key, val)| (key.clone(), val.clone()))
            .collect();

        MemtableIterator::new(snapshot)
    }
}

#[derive(Debug)]
pub struct MemtableIterator {
    inner: vec::IntoIter<(Bytes, Bytes)>,
}

impl MemtableIterator {
    fn new(pairs: Vec<(Bytes, Bytes)>) -> Self {
        MemtableIterator {
            inner: pairs.into_iter(),
        }
    }
}

impl Iterator for MemtableIterator {
    type Item = (Bytes, Bytes);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for MemtableIterator {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for MemtableIterator {}
