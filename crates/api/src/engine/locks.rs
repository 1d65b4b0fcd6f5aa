//! Per-occurrence session locks.
//!
//! The concurrency unit of isolation is the slot occurrence: all
//! mutations touching one (organization, room, slot, day) serialize
//! through a single async mutex, while different occurrences proceed in
//! parallel. Both the scan path and the background sweep go through this
//! table, so a late-arriving scan cannot race the auto-close.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rollcall_core::types::DbId;
use tokio::sync::{Mutex, RwLock};

/// Identity of one slot occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub organization_id: DbId,
    pub room: String,
    pub slot_id: DbId,
    pub day: NaiveDate,
}

/// Sharded lock table keyed by [`SessionKey`].
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct SessionLockMap {
    locks: RwLock<HashMap<SessionKey, Arc<Mutex<()>>>>,
}

impl SessionLockMap {
    /// Create a new, empty lock table.
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Return the lock for an occurrence, creating it on first use.
    ///
    /// Callers hold the returned `Arc` and `.lock().await` it; the entry
    /// stays in the table until [`purge_idle`](Self::purge_idle) removes it.
    pub async fn lock_for(&self, key: &SessionKey) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(key) {
            return Arc::clone(lock);
        }
        let mut locks = self.locks.write().await;
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    /// Drop entries nobody currently holds. Called by the sweep so the
    /// table stays bounded by the number of live occurrences.
    pub async fn purge_idle(&self) -> usize {
        let mut locks = self.locks.write().await;
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    /// Number of tracked occurrences.
    pub async fn len(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Whether the table is empty.
    pub async fn is_empty(&self) -> bool {
        self.locks.read().await.is_empty()
    }
}

impl Default for SessionLockMap {
    fn default() -> Self {
        Self::new()
    }
}
