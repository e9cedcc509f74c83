//! Organize run.
//!
//! One run = read tabs and snapshots, build a plan, apply it. A run gate
//! keeps a second run from starting while one is in flight; the guard is
//! released on drop whether the run succeeded or not.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};
use serde::Serialize;
use uuid::Uuid;

use crate::managers::kv_store::KeyValueStore;
use crate::managers::snapshot_store::SnapshotStore;
use crate::managers::tab_manager::TabHost;
use crate::services::model_bridge::ModelBridge;
use crate::services::plan_builder::PlanBuilder;
use crate::services::plan_executor::{PlanExecutor, PlanExecutorTrait};
use crate::types::errors::PlanError;
use crate::types::plan::{ExecutionReport, ReorganizationPlan};
use crate::types::settings::ModelSettings;
use crate::types::tab::TabInfo;

/// Mutual-exclusion gate for organize runs.
#[derive(Debug, Default, Clone)]
pub struct RunGate {
    running: Arc<AtomicBool>,
}

/// Held for the duration of a run.
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Result<RunGuard, PlanError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PlanError::AlreadyRunning)?;
        Ok(RunGuard {
            running: Arc::clone(&self.running),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizeOutcome {
    pub run_id: String,
    pub plan: ReorganizationPlan,
    pub report: ExecutionReport,
    /// `"<title> → <reason>"` for each preserved tab.
    pub preserved: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Organizer {
    gate: RunGate,
}

impl Organizer {
    pub fn new(gate: RunGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &RunGate {
        &self.gate
    }

    /// Runs one organize pass. Plan-build errors abort before any tab is touched.
    pub async fn organize(
        &self,
        host: &mut dyn TabHost,
        store: &dyn KeyValueStore,
        bridge: &ModelBridge,
        settings: &ModelSettings,
    ) -> Result<OrganizeOutcome, PlanError> {
        let _guard = self.gate.try_acquire()?;
        let run_id = Uuid::new_v4().to_string();

        let tabs = host.query_tabs();
        let snapshots = SnapshotStore::new(store).all()?;
        info!("Organize run {} over {} tabs", run_id, tabs.len());

        let plan = match PlanBuilder::new(bridge, settings).build(&tabs, &snapshots).await {
            Ok(plan) => plan,
            Err(e) => {
                error!("Organize run {} aborted: {}", run_id, e);
                return Err(e);
            }
        };

        let report = PlanExecutor::new(store).execute(host, &plan, &snapshots);
        let preserved = render_preserved(&plan, &tabs);

        Ok(OrganizeOutcome {
            run_id,
            plan,
            report,
            preserved,
        })
    }
}

/// Preserved-context lines, resolving titles against the tabs open at run start.
pub fn render_preserved(plan: &ReorganizationPlan, tabs: &[TabInfo]) -> Vec<String> {
    plan.preserved
        .iter()
        .map(|item| {
            let title = tabs
                .iter()
                .find(|t| t.id == item.tab_id)
                .map(|t| t.title.as_str())
                .unwrap_or("Unknown tab");
            format!("{} → {}", title, item.reason)
        })
        .collect()
}
