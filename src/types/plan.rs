use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::errors::ExecutionFailure;
use super::tab::{GroupColor, GroupId, TabId};

/// A named cluster of tabs proposed by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedGroup {
    pub name: String,
    #[serde(rename = "tabIds")]
    pub tab_ids: Vec<TabId>,
    #[serde(rename = "keepOpen", default)]
    pub keep_open: Vec<TabId>,
}

/// Justification for keeping one tab open.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreservedTab {
    #[serde(rename = "tabId")]
    pub tab_id: TabId,
    pub reason: String,
}

/// Model-produced grouping and keep-open decisions for one organize run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReorganizationPlan {
    pub groups: Vec<PlannedGroup>,
    #[serde(default)]
    pub preserved: Vec<PreservedTab>,
}

impl ReorganizationPlan {
    /// Union of every group's keep-open ids.
    pub fn keep_open_ids(&self) -> BTreeSet<TabId> {
        self.groups
            .iter()
            .flat_map(|g| g.keep_open.iter().copied())
            .collect()
    }
}

/// A group the executor actually created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutedGroup {
    pub group_id: GroupId,
    pub name: String,
    pub color: GroupColor,
    pub tab_ids: Vec<TabId>,
}

/// What the executor did, including every isolated per-item failure.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ExecutionReport {
    pub groups: Vec<ExecutedGroup>,
    pub closed: Vec<TabId>,
    pub kept: Vec<TabId>,
    pub failures: Vec<ExecutionFailure>,
}

impl ExecutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
