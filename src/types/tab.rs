use serde::{Deserialize, Serialize};

/// Host-assigned tab identifier.
pub type TabId = i64;

/// Host-assigned tab-group identifier.
pub type GroupId = i64;

/// Loading status reported by the host for a tab.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    #[default]
    Loading,
    Complete,
}

/// Represents an open browser tab as seen through the host tab API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
    pub title: String,
    pub status: TabStatus,
    pub active: bool,
    #[serde(rename = "groupId")]
    pub group_id: Option<GroupId>,
}

impl TabInfo {
    /// Only http(s) pages carry detectable page state.
    pub fn is_web_page(&self) -> bool {
        self.url.starts_with("http://") || self.url.starts_with("https://")
    }
}

/// Display colors accepted by the tab-group API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
}

impl GroupColor {
    /// Round-robin palette used when naming groups, in assignment order.
    pub const PALETTE: [GroupColor; 8] = [
        GroupColor::Grey,
        GroupColor::Blue,
        GroupColor::Red,
        GroupColor::Yellow,
        GroupColor::Green,
        GroupColor::Pink,
        GroupColor::Purple,
        GroupColor::Cyan,
    ];

    /// Palette slot for the n-th non-empty group.
    pub fn for_index(index: usize) -> GroupColor {
        Self::PALETTE[index % Self::PALETTE.len()]
    }
}

/// A tab group as reported by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabGroup {
    pub id: GroupId,
    pub title: String,
    pub color: GroupColor,
    pub collapsed: bool,
}

/// Partial update applied to a tab group. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupUpdate {
    pub title: Option<String>,
    pub color: Option<GroupColor>,
    pub collapsed: Option<bool>,
}
