//! Empty-Group Reaper.
//!
//! Runs after every tab removal. Groups left without member tabs are
//! collapsed; the group object itself is never deleted.

use log::{info, warn};

use crate::managers::tab_manager::TabHost;
use crate::types::tab::{GroupId, GroupUpdate};

/// Collapses every group with zero member tabs. Returns the ids collapsed.
pub fn reap_empty_groups(host: &mut dyn TabHost) -> Vec<GroupId> {
    let mut collapsed = Vec::new();
    for group in host.query_groups() {
        if !host.tabs_in_group(group.id).is_empty() {
            continue;
        }
        let update = GroupUpdate {
            collapsed: Some(true),
            ..GroupUpdate::default()
        };
        match host.update_group(group.id, &update) {
            Ok(_) => {
                info!("Collapsed empty group {} '{}'", group.id, group.title);
                collapsed.push(group.id);
            }
            Err(e) => warn!("Could not collapse empty group {}: {}", group.id, e),
        }
    }
    collapsed
}
