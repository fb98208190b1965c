// ── Local mirror ──
//
// Lock-free path -> value storage. A `watch` channel carries a change
// counter; `Mirror::watch` turns it into a per-path value stream.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{StorePath, Value};
use crate::store::tree::{get_at, set_at};
use crate::stream::PathWatch;

/// Point-in-time view of every mirrored path.
pub type MirrorSnapshot = Arc<BTreeMap<StorePath, Value>>;

/// Last-known value of every path the synchronizer has touched.
///
/// Entries appear on the first successful read or local edit.
/// Overlapping entries are kept consistent: writing `smartLight/state`
/// also updates a mirrored `smartLight` map, and writing `smartLight`
/// refreshes a mirrored `smartLight/state`, or drops it when the new
/// map no longer has a `state` key.
pub struct Mirror {
    entries: DashMap<StorePath, Value>,

    /// Bumped once per `apply` that changed anything.
    changes: watch::Sender<u64>,
}

impl Mirror {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0u64);
        Self {
            entries: DashMap::new(),
            changes,
        }
    }

    /// Record `value` at `path`. Returns `true` if anything changed.
    pub fn apply(&self, path: &StorePath, value: &Value) -> bool {
        let mut changed = self.store(path.clone(), value.clone());

        let related: Vec<StorePath> = self
            .entries
            .iter()
            .map(|r| r.key().clone())
            .filter(|k| k != path && k.overlaps(path))
            .collect();

        for key in related {
            if let Some(below) = key.relative(path) {
                // `key` is an ancestor: splice the new value into its map.
                let mut node = self.entries.get(&key).map(|r| r.value().clone());
                set_at(&mut node, &below, Some(value.clone()));
                if let Some(node) = node {
                    changed |= self.store(key.clone(), node);
                }
            } else if let Some(below) = path.relative(&key) {
                // `key` is a descendant: the new value replaces it wholesale.
                match get_at(Some(value), &below) {
                    Some(node) => changed |= self.store(key.clone(), node.clone()),
                    None => changed |= self.entries.remove(&key).is_some(),
                }
            }
        }

        if changed {
            self.changes.send_modify(|n| *n += 1);
        }
        changed
    }

    /// Last-known value at `path`.
    ///
    /// Falls back to the nearest mirrored ancestor, so a hydrated
    /// `smartLight` map answers for `smartLight/brightness`.
    pub fn get(&self, path: &StorePath) -> Option<Value> {
        if let Some(v) = self.entries.get(path) {
            return Some(v.value().clone());
        }
        let mut ancestor = path.parent();
        while let Some(candidate) = ancestor {
            if let Some(v) = self.entries.get(&candidate) {
                let below = candidate.relative(path)?;
                return get_at(Some(v.value()), &below).cloned();
            }
            ancestor = candidate.parent();
        }
        None
    }

    pub fn contains(&self, path: &StorePath) -> bool {
        self.entries.contains_key(path)
    }

    /// Every mirrored entry, copied out in path order.
    pub fn snapshot(&self) -> MirrorSnapshot {
        let values: BTreeMap<StorePath, Value> = self
            .entries
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        Arc::new(values)
    }

    /// Follow the mirrored value at `path`.
    ///
    /// Yields the current value (if any), then each distinct value the
    /// path takes on as reads and writes land. The stream ends when the
    /// mirror is dropped.
    pub fn watch(self: &Arc<Self>, path: StorePath) -> PathWatch {
        PathWatch::new(Arc::downgrade(self), self.changes.subscribe(), path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn store(&self, path: StorePath, value: Value) -> bool {
        match self.entries.insert(path, value.clone()) {
            Some(old) => old != value,
            None => true,
        }
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}
