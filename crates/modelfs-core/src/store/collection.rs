// ── Generic reactive resource collection ──
//
// Insertion-ordered storage with push-based change notification via
// `watch` channels. Order is part of the contract: updates replace in
// place, unseen records insert at the front, so a consumer's row order
// stays stable while records churn underneath it.

use std::sync::Arc;

use tokio::sync::watch;

use super::Applied;
use crate::model::Keyed;

/// A reactive, insertion-ordered collection for a single resource kind.
///
/// All mutation happens inside the snapshot channel's `send_modify`
/// closure -- the channel's internal lock is the write boundary, so each
/// mutation is atomic with respect to observers. Identity key is the
/// record's `(namespace, name)` pair; the collection holds at most one
/// record per key.
pub(crate) struct ResourceCollection<T: Keyed + Clone + Send + Sync + 'static> {
    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, replaced on mutation for cheap subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Keyed + Clone + Send + Sync + 'static> ResourceCollection<T> {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self { version, snapshot }
    }

    /// Apply an upsert: replace in place when the key exists
    /// (position-preserving), insert at the front when it doesn't.
    ///
    /// Absence is an implicit insert regardless of what the caller's
    /// action label said -- a delta about a record the snapshot hasn't
    /// delivered yet must still land.
    pub(crate) fn upsert(&self, record: T) -> Applied {
        let mut applied = Applied::Inserted;
        self.snapshot.send_modify(|snap| {
            let mut items: Vec<Arc<T>> = snap.as_ref().clone();
            let position = items
                .iter()
                .position(|r| r.key_matches(record.namespace(), record.name()));

            match position {
                Some(idx) => {
                    items[idx] = Arc::new(record);
                    applied = Applied::Replaced;
                }
                None => {
                    items.insert(0, Arc::new(record));
                }
            }
            *snap = Arc::new(items);
        });
        self.bump_version();
        applied
    }

    /// Remove the record with the given identity key. Idempotent: a key
    /// that was never observed is a no-op, not an error.
    pub(crate) fn remove(&self, namespace: &str, name: &str) -> Applied {
        let mut applied = Applied::Noop;
        self.snapshot.send_if_modified(|snap| {
            let Some(idx) = snap.iter().position(|r| r.key_matches(namespace, name)) else {
                return false;
            };
            let mut items: Vec<Arc<T>> = snap.as_ref().clone();
            items.remove(idx);
            *snap = Arc::new(items);
            applied = Applied::Removed;
            true
        });
        if applied == Applied::Removed {
            self.bump_version();
        }
        applied
    }

    /// Wholesale replacement, used when a fresh snapshot lands.
    pub(crate) fn replace_all(&self, records: Vec<T>) {
        let items: Vec<Arc<T>> = records.into_iter().map(Arc::new).collect();
        self.snapshot.send_modify(|snap| *snap = Arc::new(items));
        self.bump_version();
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    /// Increment the version counter.
    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
