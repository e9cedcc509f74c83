//! Background ↔ content messaging.
//!
//! The background side pulls state with a `GET_STATE` request; the content
//! side pushes `STATE` messages from its detection timer. Both paths run the
//! same detector, so an unchanged document yields the same snapshot.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::services::state_detector::{StateDetector, StateDetectorTrait};
use crate::types::errors::SnapshotError;
use crate::types::snapshot::{PageDocument, TabSnapshot};
use crate::types::tab::TabId;

/// Wire messages exchanged with a tab's content context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentMessage {
    /// Request; the reply is a `TabSnapshot` (possibly `{}`).
    GetState,
    /// Fire-and-forget push of a freshly detected snapshot.
    State { state: TabSnapshot },
}

/// A `STATE` message tagged with the tab it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePush {
    pub tab_id: TabId,
    pub message: ContentMessage,
}

/// Request/response half of the protocol, as seen from the background.
#[async_trait]
pub trait ContentChannel: Send + Sync {
    async fn request_state(&self, tab_id: TabId) -> Result<TabSnapshot, SnapshotError>;
}

/// In-process content side: keeps the latest document each tab reported and
/// answers `GET_STATE` by running the detector over it.
pub struct ContentMirror {
    detector: RwLock<StateDetector>,
    documents: Mutex<HashMap<TabId, PageDocument>>,
}

impl ContentMirror {
    pub fn new(detector: StateDetector) -> Self {
        Self {
            detector: RwLock::new(detector),
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Records the tab's current document and returns what it detects.
    pub fn update_document(&self, tab_id: TabId, doc: PageDocument) -> TabSnapshot {
        let state = self.detector().detect(&doc);
        if let Ok(mut docs) = self.documents.lock() {
            docs.insert(tab_id, doc);
        }
        state
    }

    /// The last document the tab reported.
    pub fn document(&self, tab_id: TabId) -> Option<PageDocument> {
        self.documents.lock().ok()?.get(&tab_id).cloned()
    }

    /// The detector currently in use.
    pub fn detector(&self) -> StateDetector {
        match self.detector.read() {
            Ok(detector) => detector.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swaps in a detector built from new thresholds. Later requests use it.
    pub fn set_detector(&self, detector: StateDetector) {
        match self.detector.write() {
            Ok(mut current) => *current = detector,
            Err(poisoned) => *poisoned.into_inner() = detector,
        }
    }

    /// Drops the tab's document, as when its content context unloads.
    pub fn forget(&self, tab_id: TabId) {
        if let Ok(mut docs) = self.documents.lock() {
            docs.remove(&tab_id);
        }
    }
}

#[async_trait]
impl ContentChannel for ContentMirror {
    async fn request_state(&self, tab_id: TabId) -> Result<TabSnapshot, SnapshotError> {
        let docs = self
            .documents
            .lock()
            .map_err(|e| SnapshotError::SendFailed(e.to_string()))?;
        let doc = docs.get(&tab_id).ok_or_else(|| {
            SnapshotError::SendFailed(format!("no content context in tab {}", tab_id))
        })?;
        Ok(self.detector().detect(doc))
    }
}

/// Runs the content-side detection timer for one tab.
///
/// Every `period` the document is re-read and, when any rule fired, a
/// `STATE` push is sent. The loop ends when the receiver is dropped.
pub fn spawn_detector_loop<F>(
    tab_id: TabId,
    mut read_document: F,
    detector: StateDetector,
    period: Duration,
    tx: mpsc::UnboundedSender<StatePush>,
) -> JoinHandle<()>
where
    F: FnMut() -> Option<PageDocument> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        loop {
            ticker.tick().await;
            trace!("Checking tab {} for open loops", tab_id);

            let Some(doc) = read_document() else {
                continue;
            };
            let state = detector.detect(&doc);
            if state.is_empty() {
                continue;
            }

            debug!("Tab {} pushing state {:?}", tab_id, state.activity);
            let push = StatePush {
                tab_id,
                message: ContentMessage::State { state },
            };
            if tx.send(push).is_err() {
                break;
            }
        }
    })
}
