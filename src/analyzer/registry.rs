//! Pending-result registry.
//!
//! Maps each resource identity to the handle its analysis task resolves.
//! Entries carry a sequence number assigned at insertion so the registry
//! can be enumerated in scheduling order.

use std::collections::HashMap;
use std::sync::Mutex;

use super::handle::{lock, PendingHandle};
use super::identity::ResourceIdentity;

#[derive(Default)]
struct Entries {
    by_id: HashMap<ResourceIdentity, (u64, PendingHandle)>,
    next_seq: u64,
}

/// Concurrent identity to handle map with insert-if-absent semantics.
#[derive(Default)]
pub struct ResultRegistry {
    entries: Mutex<Entries>,
}

impl ResultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `handle` unless `id` is already registered.
    ///
    /// Returns true if inserted. On false the existing handle is kept and
    /// `handle` is dropped.
    pub fn put_if_absent(&self, id: ResourceIdentity, handle: PendingHandle) -> bool {
        let mut entries = lock(&self.entries);
        if entries.by_id.contains_key(&id) {
            return false;
        }
        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.by_id.insert(id, (seq, handle));
        true
    }

    pub fn get(&self, id: &ResourceIdentity) -> Option<PendingHandle> {
        lock(&self.entries)
            .by_id
            .get(id)
            .map(|(_, handle)| handle.clone())
    }

    pub fn contains(&self, id: &ResourceIdentity) -> bool {
        lock(&self.entries).by_id.contains_key(id)
    }

    /// Snapshot of all entries in scheduling order.
    pub fn all_entries(&self) -> Vec<(ResourceIdentity, PendingHandle)> {
        let entries = lock(&self.entries);
        let mut all: Vec<_> = entries
            .by_id
            .iter()
            .map(|(id, (seq, handle))| (*seq, id.clone(), handle.clone()))
            .collect();
        drop(entries);
        all.sort_by_key(|(seq, _, _)| *seq);
        all.into_iter().map(|(_, id, handle)| (id, handle)).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
