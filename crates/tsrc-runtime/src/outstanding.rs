//! Bookkeeping of targets handed out and not yet released.
//!
//! Targets are identified by the address of their allocation. Each entry
//! keeps a clone of the `Arc`, so the address cannot be reused by another
//! allocation while the entry exists.

use std::collections::HashMap;
use std::sync::Arc;

/// Identity key of a shared target.
pub(crate) fn target_key<T: ?Sized>(target: &Arc<T>) -> usize {
    Arc::as_ptr(target).cast::<()>() as usize
}

struct Entry<T: ?Sized> {
    target: Arc<T>,
    count: usize,
}

/// Multiset of outstanding targets.
pub(crate) struct Outstanding<T: ?Sized> {
    entries: HashMap<usize, Entry<T>>,
}

impl<T: ?Sized> Outstanding<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record one more acquisition of `target`.
    pub(crate) fn insert(&mut self, target: &Arc<T>) {
        self.entries
            .entry(target_key(target))
            .or_insert_with(|| Entry {
                target: Arc::clone(target),
                count: 0,
            })
            .count += 1;
    }

    /// Record a release of `target`.
    ///
    /// Returns `false` if `target` is not outstanding.
    pub(crate) fn remove(&mut self, target: &Arc<T>) -> bool {
        let key = target_key(target);
        let Some(entry) = self.entries.get_mut(&key) else {
            return false;
        };
        debug_assert!(Arc::ptr_eq(&entry.target, target));

        entry.count -= 1;
        if entry.count == 0 {
            self.entries.remove(&key);
        }
        true
    }

    /// Whether any acquisition of `target` is not yet released.
    pub(crate) fn contains(&self, target: &Arc<T>) -> bool {
        self.entries.contains_key(&target_key(target))
    }

    /// Number of acquisitions not yet released.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(|entry| entry.count).sum()
    }
}
