use serde::{Deserialize, Serialize};

use super::snapshot::ActivityKind;
use super::tab::{GroupId, TabId};

/// Follow-up action a grouped tab still needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NudgeAction {
    FinishPr,
    SendEmail,
    ResumeVideo,
    SummarizeArticle,
    Review,
}

impl From<ActivityKind> for NudgeAction {
    fn from(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::FinishPr => NudgeAction::FinishPr,
            ActivityKind::SendEmail => NudgeAction::SendEmail,
            ActivityKind::ResumeVideo => NudgeAction::ResumeVideo,
            ActivityKind::SummarizeArticle => NudgeAction::SummarizeArticle,
            ActivityKind::SaveForm | ActivityKind::None => NudgeAction::Review,
        }
    }
}

/// Stored under `nudge_<id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NudgeRecord {
    pub action: NudgeAction,
    #[serde(rename = "groupId")]
    pub group_id: GroupId,
}

/// Per-tab nudge lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NudgeState {
    Pending,
    Transforming,
    Presented,
    Closed,
}

/// Result of running a nudge to completion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NudgeOutcome {
    pub tab_id: TabId,
    pub action: NudgeAction,
    pub text: String,
    /// False when the text passed through or the transformation fell back.
    pub transformed: bool,
    pub fallback_reason: Option<String>,
    pub state: NudgeState,
}
