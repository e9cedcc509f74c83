//! Plan Executor.
//!
//! Applies a `ReorganizationPlan` to the live tabs: groups first, in plan
//! order, then one batch close of every open tab outside the keep-open set.
//! Grouping must precede closing, or member ids would already be gone.
//!
//! Failures are isolated per group and per tab and collected in the report.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::{info, warn};

use crate::managers::kv_store::KeyValueStore;
use crate::managers::nudge_store::NudgeStore;
use crate::managers::tab_manager::TabHost;
use crate::types::errors::ExecutionFailure;
use crate::types::nudge::{NudgeAction, NudgeRecord};
use crate::types::plan::{ExecutedGroup, ExecutionReport, PlannedGroup, ReorganizationPlan};
use crate::types::snapshot::StoredSnapshot;
use crate::types::tab::{GroupColor, GroupId, GroupUpdate, TabId};

/// Trait defining plan execution.
pub trait PlanExecutorTrait {
    fn execute(
        &self,
        host: &mut dyn TabHost,
        plan: &ReorganizationPlan,
        snapshots: &HashMap<TabId, StoredSnapshot>,
    ) -> ExecutionReport;
}

pub struct PlanExecutor<'a> {
    nudges: NudgeStore<'a>,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            nudges: NudgeStore::new(store),
        }
    }

    /// Member ids that are open and not already claimed by an earlier group.
    fn valid_members(
        group: &PlannedGroup,
        open: &HashSet<TabId>,
        claimed: &mut HashSet<TabId>,
    ) -> Vec<TabId> {
        let mut members = Vec::new();
        for &id in &group.tab_ids {
            if !open.contains(&id) {
                warn!("Group '{}' names tab {} which is not open", group.name, id);
                continue;
            }
            if !claimed.insert(id) {
                warn!("Tab {} already grouped; ignoring it in '{}'", id, group.name);
                continue;
            }
            members.push(id);
        }
        members
    }

    fn record_nudges(
        &self,
        group_id: GroupId,
        members: &[TabId],
        snapshots: &HashMap<TabId, StoredSnapshot>,
        report: &mut ExecutionReport,
    ) {
        for &tab_id in members {
            let activity = snapshots
                .get(&tab_id)
                .map(|s| s.state.activity)
                .unwrap_or_default();
            let record = NudgeRecord {
                action: NudgeAction::from(activity),
                group_id,
            };
            if let Err(e) = self.nudges.put(tab_id, &record) {
                warn!("Could not store nudge for tab {}: {}", tab_id, e);
                report.failures.push(ExecutionFailure::NudgeWriteFailed {
                    tab_id,
                    reason: e.to_string(),
                });
            }
        }
    }
}

impl PlanExecutorTrait for PlanExecutor<'_> {
    fn execute(
        &self,
        host: &mut dyn TabHost,
        plan: &ReorganizationPlan,
        snapshots: &HashMap<TabId, StoredSnapshot>,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let open_tabs = host.query_tabs();
        let open: HashSet<TabId> = open_tabs.iter().map(|t| t.id).collect();

        let mut claimed = HashSet::new();
        let mut color_idx = 0;

        for group in &plan.groups {
            let members = Self::valid_members(group, &open, &mut claimed);
            if members.is_empty() {
                continue;
            }
            let color = GroupColor::for_index(color_idx);
            color_idx += 1;

            let group_id = match host.group_tabs(&members) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Grouping '{}' failed: {}", group.name, e);
                    report.failures.push(ExecutionFailure::GroupingFailed {
                        group: group.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let update = GroupUpdate {
                title: Some(group.name.clone()),
                color: Some(color),
                collapsed: Some(true),
            };
            if let Err(e) = host.update_group(group_id, &update) {
                warn!("Styling group '{}' failed: {}", group.name, e);
                report.failures.push(ExecutionFailure::GroupingFailed {
                    group: group.name.clone(),
                    reason: e.to_string(),
                });
            }

            self.record_nudges(group_id, &members, snapshots, &mut report);
            report.groups.push(ExecutedGroup {
                group_id,
                name: group.name.clone(),
                color,
                tab_ids: members,
            });
        }

        let keep: BTreeSet<TabId> = plan.keep_open_ids();
        let (kept, to_close): (Vec<TabId>, Vec<TabId>) = open_tabs
            .iter()
            .map(|t| t.id)
            .partition(|id| keep.contains(id));

        let failed: HashMap<TabId, String> = if to_close.is_empty() {
            HashMap::new()
        } else {
            host.remove_tabs(&to_close)
                .into_iter()
                .map(|(id, e)| (id, e.to_string()))
                .collect()
        };

        for id in to_close {
            match failed.get(&id) {
                Some(reason) => {
                    warn!("Closing tab {} failed: {}", id, reason);
                    report.failures.push(ExecutionFailure::CloseFailed {
                        tab_id: id,
                        reason: reason.clone(),
                    });
                }
                None => report.closed.push(id),
            }
        }
        report.kept = kept;

        info!(
            "Plan applied: {} groups, {} closed, {} kept, {} failures",
            report.groups.len(),
            report.closed.len(),
            report.kept.len(),
            report.failures.len()
        );
        report
    }
}
