//! Snapshot Store.
//!
//! Durable mapping from tab id to the last detected page state plus page
//! metadata, kept under `tab_<id>`. Writes are wholesale overwrites; concurrent
//! writers for the same tab resolve as last-write-wins.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};

use crate::managers::kv_store::KeyValueStore;
use crate::managers::tab_manager::TabHost;
use crate::services::content_channel::ContentChannel;
use crate::types::errors::{SnapshotError, StorageError};
use crate::types::snapshot::{StoredSnapshot, TabSnapshot};
use crate::types::tab::{TabId, TabInfo};

const KEY_PREFIX: &str = "tab_";

/// Snapshot store over a borrowed key-value store.
pub struct SnapshotStore<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    pub fn key(tab_id: TabId) -> String {
        format!("{}{}", KEY_PREFIX, tab_id)
    }

    /// Merges the tab's url/title/id into `state` and overwrites the stored entry.
    pub fn save(&self, tab: &TabInfo, state: TabSnapshot) -> Result<StoredSnapshot, StorageError> {
        let stored = StoredSnapshot {
            state,
            url: tab.url.clone(),
            title: tab.title.clone(),
            id: tab.id,
        };
        self.store
            .set(&Self::key(tab.id), &serde_json::to_value(&stored)?)?;
        Ok(stored)
    }

    pub fn get(&self, tab_id: TabId) -> Result<Option<StoredSnapshot>, StorageError> {
        match self.store.get(&Self::key(tab_id))? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Every stored snapshot keyed by tab id. Undecodable entries are skipped.
    pub fn all(&self) -> Result<HashMap<TabId, StoredSnapshot>, StorageError> {
        let mut snapshots = HashMap::new();
        for (key, value) in self.store.entries_with_prefix(KEY_PREFIX)? {
            match serde_json::from_value::<StoredSnapshot>(value) {
                Ok(snapshot) => {
                    snapshots.insert(snapshot.id, snapshot);
                }
                Err(e) => warn!("Skipping unreadable snapshot {}: {}", key, e),
            }
        }
        Ok(snapshots)
    }

    pub fn remove(&self, tab_id: TabId) -> Result<(), StorageError> {
        self.store.delete(&Self::key(tab_id))
    }

    /// Pulls fresh state from the tab's content side and stores it.
    ///
    /// Non-web tabs are skipped; a failed or timed-out request leaves the
    /// stored entry untouched.
    pub async fn save_snapshot(
        &self,
        host: &dyn TabHost,
        channel: &dyn ContentChannel,
        tab_id: TabId,
        timeout: Duration,
    ) -> Result<StoredSnapshot, SnapshotError> {
        let tab = host.get_tab(tab_id).map_err(SnapshotError::Host)?;
        if !tab.is_web_page() {
            return Err(SnapshotError::DetectionSkipped(tab.url));
        }

        let state = match tokio::time::timeout(timeout, channel.request_state(tab_id)).await {
            Ok(result) => result?,
            Err(_) => return Err(SnapshotError::Timeout(tab_id)),
        };

        debug!("Saving state for tab {}: {:?}", tab_id, state.activity);
        Ok(self.save(&tab, state)?)
    }
}
