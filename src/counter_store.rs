// Last-observed cumulative counters per container, kept in memory across rounds.

use crate::models::CumulativeCounters;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterEntry {
    pub counters: CumulativeCounters,
    pub captured_at: DateTime<Utc>,
}

/// Plain map from container id to its last entry. Not synchronized; see [`SharedCounterStore`].
#[derive(Debug, Default)]
pub struct CounterStore {
    entries: HashMap<String, CounterEntry>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&CounterEntry> {
        self.entries.get(id)
    }

    /// Stores `entry` for `id`, returning whatever was there before.
    pub fn put(&mut self, id: &str, entry: CounterEntry) -> Option<CounterEntry> {
        self.entries.insert(id.to_string(), entry)
    }

    /// Drops every entry whose id is not in `live_ids`. Returns how many were removed.
    pub fn retain_only(&mut self, live_ids: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| live_ids.contains(id));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cloneable handle to one [`CounterStore`] behind a single lock. Every read-then-write
/// for a container happens inside one critical section, so concurrent per-container
/// tasks never lose each other's updates.
#[derive(Debug, Clone, Default)]
pub struct SharedCounterStore {
    inner: Arc<Mutex<CounterStore>>,
}

impl SharedCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Critical sections never panic midway, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, CounterStore> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomically records `entry` for `id` and hands back the previous one.
    pub fn swap(&self, id: &str, entry: CounterEntry) -> Option<CounterEntry> {
        self.lock().put(id, entry)
    }

    pub fn get(&self, id: &str) -> Option<CounterEntry> {
        self.lock().get(id).copied()
    }

    pub fn retain_only(&self, live_ids: &HashSet<String>) -> usize {
        self.lock().retain_only(live_ids)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
