//! Plan Builder.
//!
//! Turns the open tabs and their stored snapshots into one prompt, sends it
//! through the model bridge, and parses the reply into a `ReorganizationPlan`.
//! Any failure here aborts the run; nothing is ever partially applied.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info};

use crate::services::model_bridge::ModelBridge;
use crate::types::errors::PlanError;
use crate::types::plan::ReorganizationPlan;
use crate::types::settings::ModelSettings;
use crate::types::snapshot::StoredSnapshot;
use crate::types::tab::{TabId, TabInfo};

const PROMPT_HEADER: &str = "You are an expert tab organizer. Below is a list of open browser tabs \
(title + url + any detected unfinished work).";

const RESPONSE_FORMAT: &str = r#"Return ONLY valid JSON in this exact format:
{
  "groups": [
    {"name": "React Debugging", "tabIds": [12,15,18], "keepOpen": [15]},
    {"name": "Job Applications", "tabIds": [23,24], "keepOpen": [23,24]}
  ],
  "preserved": [
    {"tabId": 15, "reason": "Half-written GitHub PR comment"},
    {"tabId": 24, "reason": "Gmail draft to recruiter"}
  ]
}"#;

/// Trait defining plan construction.
pub trait PlanBuilderTrait {
    fn build_prompt(&self, tabs: &[TabInfo], snapshots: &HashMap<TabId, StoredSnapshot>) -> String;
}

pub struct PlanBuilder<'a> {
    bridge: &'a ModelBridge,
    settings: &'a ModelSettings,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(bridge: &'a ModelBridge, settings: &'a ModelSettings) -> Self {
        Self { bridge, settings }
    }

    /// Prompts the model and parses its reply.
    pub async fn build(
        &self,
        tabs: &[TabInfo],
        snapshots: &HashMap<TabId, StoredSnapshot>,
    ) -> Result<ReorganizationPlan, PlanError> {
        let prompt = self.build_prompt(tabs, snapshots);
        let timeout = Duration::from_secs(self.settings.timeout_secs);

        info!("Requesting plan for {} tabs", tabs.len());
        let raw = self.bridge.run(&prompt, timeout).await?;
        debug!("Model replied with {} chars", raw.len());

        parse_plan(&raw)
    }
}

impl PlanBuilderTrait for PlanBuilder<'_> {
    fn build_prompt(&self, tabs: &[TabInfo], snapshots: &HashMap<TabId, StoredSnapshot>) -> String {
        render_prompt(tabs, snapshots, self.settings.max_groups)
    }
}

/// Renders the organize prompt. `max_groups` is a request to the model, not a limit we check.
pub fn render_prompt(
    tabs: &[TabInfo],
    snapshots: &HashMap<TabId, StoredSnapshot>,
    max_groups: usize,
) -> String {
    let mut prompt = format!(
        "{}\n\n\
         Group them into logical topics (max {} groups). For each group:\n\
         - Give a short, human-friendly name (max 6 words)\n\
         - List the tab ids that belong to it\n\
         - For any tab with a draft/video/article, mark it \"KEEP_OPEN\" and give a one-line reason\n\n\
         {}\n\n\
         Tabs:\n",
        PROMPT_HEADER, max_groups, RESPONSE_FORMAT
    );
    for tab in tabs {
        prompt.push_str(&tab_line(tab, snapshots.get(&tab.id)));
        prompt.push('\n');
    }
    prompt
}

/// `- [id:12] Title | url` followed by any open-loop markers.
fn tab_line(tab: &TabInfo, saved: Option<&StoredSnapshot>) -> String {
    let mut line = format!("- [id:{}] {} | {}", tab.id, tab.title, tab.url);
    if let Some(saved) = saved {
        if saved.state.draft.is_some() {
            line.push_str(" [DRAFT]");
        }
        if let Some(secs) = saved.state.video_time_seconds {
            line.push_str(&format!(" [VIDEO PAUSED @{}s]", secs));
        }
        if saved.state.scroll_position.is_some() {
            line.push_str(" [READING PROGRESS]");
        }
    }
    line
}

/// Parses a model reply into a plan.
///
/// A reply wrapped in a Markdown code fence is unwrapped first. Malformed
/// JSON and well-formed JSON of the wrong shape are reported separately.
pub fn parse_plan(raw: &str) -> Result<ReorganizationPlan, PlanError> {
    let body = strip_code_fence(raw);

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| PlanError::PlanParseFailed(e.to_string()))?;

    serde_json::from_value(value).map_err(|e| PlanError::PlanShapeInvalid(e.to_string()))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip an info string such as `json`, on its own line or inline.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
