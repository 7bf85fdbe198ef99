use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// In-process serialization points for the storage engine.
///
/// None of the mutations here run inside a cross-store transaction, so the
/// engine serializes instead: one async mutex per `(creator_id, work_id)`
/// key covers the backup-move/record-write sequence, and one global mutex
/// covers quota admission so two uploads cannot both pass the headroom
/// check before either commits.
#[derive(Default)]
pub struct WorkLocks {
    works: DashMap<(String, String), Arc<Mutex<()>>>,
    quota: Arc<Mutex<()>>,
}

impl WorkLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding one work key. Entries are never evicted; the
    /// keyspace is bounded by the number of works ever touched.
    pub fn work(&self, creator_id: &str, work_id: &str) -> Arc<Mutex<()>> {
        self.works
            .entry((creator_id.to_string(), work_id.to_string()))
            .or_default()
            .clone()
    }

    /// Mutexes for a rename, acquired in sorted key order so two renames
    /// touching the same pair of keys cannot deadlock.
    pub fn work_pair(
        &self,
        a: (&str, &str),
        b: (&str, &str),
    ) -> (Arc<Mutex<()>>, Arc<Mutex<()>>) {
        if a <= b {
            (self.work(a.0, a.1), self.work(b.0, b.1))
        } else {
            (self.work(b.0, b.1), self.work(a.0, a.1))
        }
    }

    /// The global quota admission mutex.
    pub fn quota(&self) -> Arc<Mutex<()>> {
        self.quota.clone()
    }
}
