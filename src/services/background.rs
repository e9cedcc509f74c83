//! Background tab-event listeners.
//!
//! Activation and load-complete events pull fresh state into the snapshot
//! store; `STATE` pushes are written through; removals optionally purge the
//! tab's keys and then run the reaper. Nothing here surfaces an error: every
//! failure is logged and the event is dropped.

use std::time::Duration;

use log::{debug, warn};

use crate::managers::kv_store::KeyValueStore;
use crate::managers::nudge_store::NudgeStore;
use crate::managers::snapshot_store::SnapshotStore;
use crate::managers::tab_manager::TabHost;
use crate::services::content_channel::{ContentChannel, ContentMessage, StatePush};
use crate::services::group_reaper::reap_empty_groups;
use crate::types::errors::SnapshotError;
use crate::types::settings::OrganizerSettings;
use crate::types::snapshot::StoredSnapshot;
use crate::types::tab::{GroupId, TabId, TabStatus};

pub struct Background<'a> {
    store: &'a dyn KeyValueStore,
    settings: &'a OrganizerSettings,
}

impl<'a> Background<'a> {
    pub fn new(store: &'a dyn KeyValueStore, settings: &'a OrganizerSettings) -> Self {
        Self { store, settings }
    }

    fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.detector.content_timeout_ms)
    }

    async fn capture(
        &self,
        host: &dyn TabHost,
        channel: &dyn ContentChannel,
        tab_id: TabId,
    ) -> Option<StoredSnapshot> {
        let snapshots = SnapshotStore::new(self.store);
        match snapshots
            .save_snapshot(host, channel, tab_id, self.content_timeout())
            .await
        {
            Ok(saved) => Some(saved),
            Err(SnapshotError::DetectionSkipped(url)) => {
                debug!("Not snapshotting tab {} ({})", tab_id, url);
                None
            }
            Err(e) => {
                warn!("Snapshot for tab {} skipped: {}", tab_id, e);
                None
            }
        }
    }

    pub async fn on_tab_activated(
        &self,
        host: &dyn TabHost,
        channel: &dyn ContentChannel,
        tab_id: TabId,
    ) -> Option<StoredSnapshot> {
        self.capture(host, channel, tab_id).await
    }

    /// Only a transition to `complete` triggers a snapshot.
    pub async fn on_tab_updated(
        &self,
        host: &dyn TabHost,
        channel: &dyn ContentChannel,
        tab_id: TabId,
        status: Option<TabStatus>,
    ) -> Option<StoredSnapshot> {
        if status != Some(TabStatus::Complete) {
            return None;
        }
        self.capture(host, channel, tab_id).await
    }

    /// Writes a pushed `STATE` through to the store with the same merge as a pull.
    pub fn on_state_push(&self, host: &dyn TabHost, push: StatePush) -> Option<StoredSnapshot> {
        let ContentMessage::State { state } = push.message else {
            return None;
        };
        let tab = match host.get_tab(push.tab_id) {
            Ok(tab) => tab,
            Err(e) => {
                debug!("Dropping state push: {}", e);
                return None;
            }
        };
        if !tab.is_web_page() {
            return None;
        }
        match SnapshotStore::new(self.store).save(&tab, state) {
            Ok(saved) => Some(saved),
            Err(e) => {
                warn!("State push for tab {} not stored: {}", push.tab_id, e);
                None
            }
        }
    }

    /// Returns the groups the reaper collapsed.
    pub fn on_tab_removed(&self, host: &mut dyn TabHost, tab_id: TabId) -> Vec<GroupId> {
        if self.settings.storage.purge_on_tab_removed {
            if let Err(e) = SnapshotStore::new(self.store).remove(tab_id) {
                warn!("Could not purge snapshot for tab {}: {}", tab_id, e);
            }
            if let Err(e) = NudgeStore::new(self.store).remove(tab_id) {
                warn!("Could not purge nudge for tab {}: {}", tab_id, e);
            }
        }
        reap_empty_groups(host)
    }
}
