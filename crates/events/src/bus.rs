//! Publishing side of configuration changes.
//!
//! [`ConfigBus`] owns the [`SharedConfigStore`]. Every mutation made through
//! it publishes the resulting snapshot to watchers and a [`ConfigChange`]
//! record to broadcast subscribers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parkrate_core::store::{ConfigSnapshot, RateConfigStore, SharedConfigStore};
use parkrate_core::types::SnapshotVersion;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

// ---------------------------------------------------------------------------
// ConfigChange
// ---------------------------------------------------------------------------

/// Record of one published configuration version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigChange {
    pub version: SnapshotVersion,

    /// Short description of the mutation, e.g. `"rates.upsert"`.
    pub summary: String,

    pub timestamp: DateTime<Utc>,
}

impl ConfigChange {
    pub fn new(version: SnapshotVersion, summary: impl Into<String>) -> Self {
        Self {
            version,
            summary: summary.into(),
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the change broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

pub struct ConfigBus {
    store: SharedConfigStore,
    snapshots: watch::Sender<Arc<ConfigSnapshot>>,
    changes: broadcast::Sender<ConfigChange>,
}

impl ConfigBus {
    pub fn new(store: RateConfigStore) -> Self {
        let store = SharedConfigStore::new(store);
        let (snapshots, _) = watch::channel(store.snapshot());
        let (changes, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self {
            store,
            snapshots,
            changes,
        }
    }

    /// The underlying store, for direct reads.
    pub fn store(&self) -> &SharedConfigStore {
        &self.store
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.snapshots.borrow().clone()
    }

    /// Watch snapshot publications. Intermediate versions may be skipped.
    pub fn watch(&self) -> watch::Receiver<Arc<ConfigSnapshot>> {
        self.snapshots.subscribe()
    }

    /// Subscribe to change records for every published version.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.changes.subscribe()
    }

    /// Mutate the store and publish the resulting snapshot.
    ///
    /// Publication is skipped when the mutation did not bump the version, or
    /// when a concurrent caller has already published a newer one.
    pub fn update<R>(
        &self,
        summary: impl Into<String>,
        f: impl FnOnce(&mut RateConfigStore) -> R,
    ) -> R {
        let (result, snapshot) = self.store.update(f);
        let version = snapshot.version();

        let published = self.snapshots.send_if_modified(|current| {
            if snapshot.version() > current.version() {
                *current = snapshot;
                true
            } else {
                false
            }
        });

        if published {
            let change = ConfigChange::new(version, summary);
            tracing::debug!(version, summary = %change.summary, "Published configuration snapshot");
            // Only fails when there are zero receivers.
            let _ = self.changes.send(change);
        }
        result
    }
}

impl Default for ConfigBus {
    fn default() -> Self {
        Self::new(RateConfigStore::with_default_rates())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
