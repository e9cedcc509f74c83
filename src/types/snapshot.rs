use serde::{Deserialize, Serialize};

use super::tab::TabId;

/// The single in-progress activity a tab is believed to hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    #[default]
    None,
    FinishPr,
    SendEmail,
    ResumeVideo,
    SummarizeArticle,
    SaveForm,
}

impl ActivityKind {
    pub fn is_none(&self) -> bool {
        matches!(self, ActivityKind::None)
    }
}

/// Detected page state for one tab at one point in time.
///
/// Serialized with the wire names the content side uses (`action`, `videoTime`,
/// `scroll`, `articleText`); an idle page serializes to `{}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TabSnapshot {
    #[serde(rename = "action", default, skip_serializing_if = "ActivityKind::is_none")]
    pub activity: ActivityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(rename = "videoTime", default, skip_serializing_if = "Option::is_none")]
    pub video_time_seconds: Option<u64>,
    #[serde(rename = "scroll", default, skip_serializing_if = "Option::is_none")]
    pub scroll_position: Option<u64>,
    #[serde(rename = "articleText", default, skip_serializing_if = "Option::is_none")]
    pub article_text: Option<String>,
}

impl TabSnapshot {
    /// True when no detection rule fired.
    pub fn is_empty(&self) -> bool {
        self.activity.is_none()
            && self.draft.is_none()
            && self.video_time_seconds.is_none()
            && self.scroll_position.is_none()
            && self.article_text.is_none()
    }
}

/// A snapshot merged with the page metadata it was captured from.
/// This is the value stored under `tab_<id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSnapshot {
    #[serde(flatten)]
    pub state: TabSnapshot,
    pub url: String,
    pub title: String,
    pub id: TabId,
}

/// Serializable view of the parts of a live document the detector inspects.
///
/// Elements appear in document order, so "first match" lookups behave like
/// `querySelector`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PageDocument {
    #[serde(default)]
    pub elements: Vec<PageElement>,
    #[serde(rename = "scrollY", default)]
    pub scroll_y: f64,
    #[serde(rename = "innerHeight", default)]
    pub inner_height: f64,
    #[serde(rename = "bodyText", default)]
    pub body_text: String,
}

/// Element kinds relevant to open-loop detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum PageElement {
    Textarea {
        #[serde(default)]
        placeholder: Option<String>,
        #[serde(rename = "ariaLabel", default)]
        aria_label: Option<String>,
        #[serde(default)]
        value: String,
    },
    Div {
        #[serde(default)]
        role: Option<String>,
        #[serde(rename = "contentEditable", default)]
        content_editable: bool,
        #[serde(rename = "innerText", default)]
        inner_text: String,
    },
    Video {
        #[serde(rename = "currentTime")]
        current_time: f64,
        paused: bool,
    },
}
