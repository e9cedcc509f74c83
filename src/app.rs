//! App Core for Tabloop.
//!
//! Central struct holding the tab host, the database, settings, the content
//! mirror and the model, and wiring tab events to the background listeners.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::database::connection::Database;
use crate::managers::kv_store::SqliteStore;
use crate::managers::tab_manager::{TabHost, TabManager};
use crate::services::background::Background;
use crate::services::content_channel::{spawn_detector_loop, ContentMirror, StatePush};
use crate::services::language_model::{HttpModelClient, LanguageModel};
use crate::services::model_bridge::ModelBridge;
use crate::services::nudge_engine::{LogPresenter, NudgeEngine};
use crate::services::organizer::{OrganizeOutcome, Organizer};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::state_detector::StateDetector;
use crate::types::errors::{HostError, NudgeError, PlanError};
use crate::types::nudge::NudgeOutcome;
use crate::types::settings::OrganizerSettings;
use crate::types::snapshot::StoredSnapshot;
use crate::types::tab::{GroupId, TabId, TabInfo, TabStatus};

/// Central application struct.
///
/// Store-backed components (`SnapshotStore`, `NudgeStore`, `PlanExecutor`, ...)
/// borrow the connection and are created on demand from `db.connection()`.
pub struct App {
    pub db: Database,
    pub tabs: TabManager,
    pub settings_engine: SettingsEngine,
    pub content: Arc<ContentMirror>,
    pub organizer: Organizer,
    model: Option<Arc<dyn LanguageModel>>,
    bridge: Option<ModelBridge>,
    detector_loops: HashMap<TabId, JoinHandle<()>>,
    state_tx: mpsc::UnboundedSender<StatePush>,
    state_rx: Option<mpsc::UnboundedReceiver<StatePush>>,
}

impl App {
    /// Opens the database at `db_path`, loads settings and connects the
    /// configured model. Must be called inside a tokio runtime.
    pub fn new(
        db_path: &str,
        settings_path: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open(db_path)?;
        let mut settings_engine = SettingsEngine::new(settings_path);
        settings_engine.load()?;

        let mut app = Self::with_parts(db, settings_engine);
        app.reload_model();
        Ok(app)
    }

    /// Assembles an app without a model.
    pub fn with_parts(db: Database, settings_engine: SettingsEngine) -> Self {
        let detector = StateDetector::new(settings_engine.get_settings().detector.clone());
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        Self {
            db,
            tabs: TabManager::new(),
            settings_engine,
            content: Arc::new(ContentMirror::new(detector)),
            organizer: Organizer::default(),
            model: None,
            bridge: None,
            detector_loops: HashMap::new(),
            state_tx,
            state_rx: Some(state_rx),
        }
    }

    pub fn settings(&self) -> &OrganizerSettings {
        self.settings_engine.get_settings()
    }

    /// Installs a model and starts a bridge for it. Must be called inside a tokio runtime.
    pub fn set_model(&mut self, model: Arc<dyn LanguageModel>) {
        self.bridge = Some(ModelBridge::spawn(Arc::clone(&model)));
        self.model = Some(model);
    }

    /// Rebuilds the HTTP model client from the current model settings.
    pub fn reload_model(&mut self) {
        match HttpModelClient::from_settings(&self.settings().model) {
            Ok(client) => {
                info!("Using model '{}' at {}", self.settings().model.model, self.settings().model.endpoint);
                self.set_model(Arc::new(client));
            }
            Err(e) => {
                warn!("{}; organize and transformations are unavailable", e);
                self.model = None;
                self.bridge = None;
            }
        }
    }

    /// Receiver for `STATE` pushes from the detector loops. Can be taken once.
    pub fn take_state_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<StatePush>> {
        self.state_rx.take()
    }

    /// Opens a tab and starts its content-side detection timer.
    pub fn open_tab(&mut self, url: &str, title: &str, active: bool) -> TabId {
        let tab_id = self.tabs.open_tab(url, title, active);
        self.watch_tab(tab_id);
        tab_id
    }

    fn watch_tab(&mut self, tab_id: TabId) {
        if self.detector_loops.contains_key(&tab_id) {
            return;
        }
        let content = Arc::clone(&self.content);
        let period = Duration::from_secs(self.settings().detector.interval_secs.max(1));
        let handle = spawn_detector_loop(
            tab_id,
            move || content.document(tab_id),
            self.content.detector(),
            period,
            self.state_tx.clone(),
        );
        self.detector_loops.insert(tab_id, handle);
    }

    /// Applies the current detector settings to pulls and restarts every
    /// detection timer with the new thresholds and interval.
    pub fn reload_detector(&mut self) {
        self.content
            .set_detector(StateDetector::new(self.settings().detector.clone()));
        let watched: Vec<TabId> = self.detector_loops.keys().copied().collect();
        for tab_id in &watched {
            if let Some(handle) = self.detector_loops.remove(tab_id) {
                handle.abort();
            }
            self.watch_tab(*tab_id);
        }
        info!("Detector settings applied to {} tabs", watched.len());
    }

    fn unwatch_tab(&mut self, tab_id: TabId) {
        if let Some(handle) = self.detector_loops.remove(&tab_id) {
            handle.abort();
        }
        self.content.forget(tab_id);
    }

    pub async fn activate_tab(&mut self, tab_id: TabId) -> Result<Option<StoredSnapshot>, HostError> {
        self.tabs.activate_tab(tab_id)?;
        let store = SqliteStore::new(self.db.connection());
        let background = Background::new(&store, self.settings_engine.get_settings());
        Ok(background
            .on_tab_activated(&self.tabs, self.content.as_ref(), tab_id)
            .await)
    }

    pub async fn update_tab(
        &mut self,
        tab_id: TabId,
        url: Option<&str>,
        title: Option<&str>,
        status: Option<TabStatus>,
    ) -> Result<(TabInfo, Option<StoredSnapshot>), HostError> {
        let previous_url = self.tabs.get_tab(tab_id)?.url;
        let tab = self.tabs.update_tab(tab_id, url, title, status)?;
        if tab.url != previous_url {
            // The old page's document must not be read as the new page's state.
            debug!("Tab {} navigated to {}", tab_id, tab.url);
            self.content.forget(tab_id);
        }
        let store = SqliteStore::new(self.db.connection());
        let background = Background::new(&store, self.settings_engine.get_settings());
        let saved = background
            .on_tab_updated(&self.tabs, self.content.as_ref(), tab_id, status)
            .await;
        Ok((tab, saved))
    }

    /// Closes a tab and returns the groups the reaper collapsed afterwards.
    pub fn remove_tab(&mut self, tab_id: TabId) -> Result<Vec<GroupId>, HostError> {
        if let Some((_, e)) = self.tabs.remove_tabs(&[tab_id]).into_iter().next() {
            return Err(e);
        }
        Ok(self.after_tabs_removed(&[tab_id]))
    }

    /// Runs removal listeners for tabs that are already gone.
    fn after_tabs_removed(&mut self, tab_ids: &[TabId]) -> Vec<GroupId> {
        for &tab_id in tab_ids {
            self.unwatch_tab(tab_id);
        }
        let store = SqliteStore::new(self.db.connection());
        let background = Background::new(&store, self.settings_engine.get_settings());
        let mut collapsed = Vec::new();
        for &tab_id in tab_ids {
            for group_id in background.on_tab_removed(&mut self.tabs, tab_id) {
                if !collapsed.contains(&group_id) {
                    collapsed.push(group_id);
                }
            }
        }
        collapsed
    }

    pub fn apply_state_push(&self, push: StatePush) -> Option<StoredSnapshot> {
        let store = SqliteStore::new(self.db.connection());
        Background::new(&store, self.settings_engine.get_settings()).on_state_push(&self.tabs, push)
    }

    /// Runs one organize pass, then the removal listeners for every tab it closed.
    pub async fn organize(&mut self) -> Result<OrganizeOutcome, PlanError> {
        let bridge = self
            .bridge
            .as_ref()
            .ok_or_else(|| PlanError::ModelInvocationFailed("No language model configured".to_string()))?;
        let store = SqliteStore::new(self.db.connection());
        let outcome = self
            .organizer
            .organize(&mut self.tabs, &store, bridge, &self.settings_engine.get_settings().model)
            .await?;

        self.after_tabs_removed(&outcome.report.closed);
        Ok(outcome)
    }

    pub async fn run_nudge(&mut self, tab_id: TabId) -> Result<NudgeOutcome, NudgeError> {
        let store = SqliteStore::new(self.db.connection());
        let engine = NudgeEngine::new(&store);
        let mut presenter = LogPresenter;
        let outcome = engine
            .run_nudge(tab_id, &mut self.tabs, self.model.as_deref(), &mut presenter)
            .await?;

        self.after_tabs_removed(&[tab_id]);
        Ok(outcome)
    }

    /// Stops every detection timer.
    pub fn shutdown(&mut self) {
        for (_, handle) in self.detector_loops.drain() {
            handle.abort();
        }
        info!("Tabloop shut down");
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for handle in self.detector_loops.values() {
            handle.abort();
        }
    }
}
