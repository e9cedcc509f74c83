//! Unit tests for the Empty-Group Reaper.

use tabloop::managers::tab_manager::{TabHost, TabManager};
use tabloop::services::group_reaper::reap_empty_groups;
use tabloop::types::tab::GroupUpdate;

#[test]
fn test_empty_group_is_collapsed_not_deleted() {
    let mut host = TabManager::new();
    let a = host.open_tab("https://a.test", "A", true);
    let b = host.open_tab("https://b.test", "B", false);
    let group = host.group_tabs(&[a]).unwrap();

    host.remove_tabs(&[a]);
    let collapsed = reap_empty_groups(&mut host);

    assert_eq!(collapsed, vec![group]);
    let groups = host.query_groups();
    assert_eq!(groups.len(), 1);
    assert!(groups[0].collapsed);
    assert!(host.get_tab(b).is_ok());
}

#[test]
fn test_groups_with_members_are_left_alone() {
    let mut host = TabManager::new();
    let a = host.open_tab("https://a.test", "A", true);
    let b = host.open_tab("https://b.test", "B", false);
    let group = host.group_tabs(&[a, b]).unwrap();

    host.remove_tabs(&[a]);
    assert!(reap_empty_groups(&mut host).is_empty());
    let kept = host.query_groups().into_iter().find(|g| g.id == group).unwrap();
    assert!(!kept.collapsed);
}

#[test]
fn test_already_collapsed_empty_group_is_collapsed_again() {
    let mut host = TabManager::new();
    let a = host.open_tab("https://a.test", "A", true);
    let group = host.group_tabs(&[a]).unwrap();
    host.update_group(group, &GroupUpdate { title: Some("Done".to_string()), collapsed: Some(true), ..GroupUpdate::default() })
        .unwrap();
    host.remove_tabs(&[a]);

    assert_eq!(reap_empty_groups(&mut host), vec![group]);
    let groups = host.query_groups();
    assert_eq!(groups[0].title, "Done");
}

#[test]
fn test_no_groups_is_a_no_op() {
    let mut host = TabManager::new();
    host.open_tab("https://a.test", "A", true);
    assert!(reap_empty_groups(&mut host).is_empty());
}
