use tabloop::managers::tab_manager::{TabHost, TabManager};
use tabloop::types::errors::HostError;
use tabloop::types::tab::{GroupColor, GroupUpdate, TabStatus};

#[test]
fn test_open_tab_returns_unique_ids() {
    let mut mgr = TabManager::new();
    let id1 = mgr.open_tab("https://a.test", "A", true);
    let id2 = mgr.open_tab("https://b.test", "B", false);
    assert_ne!(id1, id2);
    assert_eq!(mgr.tab_count(), 2);
}

#[test]
fn test_open_tab_sets_active_when_first() {
    let mut mgr = TabManager::new();
    let id = mgr.open_tab("https://example.com", "Example", false);
    // First tab should become active even if active=false
    assert_eq!(mgr.get_active_tab().unwrap().id, id);
}

#[test]
fn test_new_tab_is_loading_and_ungrouped() {
    let mut mgr = TabManager::new();
    let id = mgr.open_tab("https://example.com", "Example", true);
    let tab = mgr.get_tab(id).unwrap();
    assert_eq!(tab.status, TabStatus::Loading);
    assert_eq!(tab.group_id, None);
}

#[test]
fn test_update_tab_changes_fields() {
    let mut mgr = TabManager::new();
    let id = mgr.open_tab("https://example.com", "", true);
    let tab = mgr
        .update_tab(id, Some("https://github.com/pulls"), Some("Pull requests"), Some(TabStatus::Complete))
        .unwrap();
    assert_eq!(tab.url, "https://github.com/pulls");
    assert_eq!(tab.title, "Pull requests");
    assert_eq!(tab.status, TabStatus::Complete);
}

#[test]
fn test_update_missing_tab_fails() {
    let mut mgr = TabManager::new();
    assert_eq!(mgr.update_tab(42, None, None, None).unwrap_err(), HostError::TabNotFound(42));
}

#[test]
fn test_activate_tab() {
    let mut mgr = TabManager::new();
    let id1 = mgr.open_tab("https://a.test", "A", true);
    let id2 = mgr.open_tab("https://b.test", "B", false);
    mgr.activate_tab(id2).unwrap();
    assert_eq!(mgr.get_active_tab().unwrap().id, id2);
    assert!(!mgr.get_tab(id1).unwrap().active);
}

#[test]
fn test_group_tabs_assigns_membership() {
    let mut mgr = TabManager::new();
    let a = mgr.open_tab("https://a.test", "A", true);
    let b = mgr.open_tab("https://b.test", "B", false);
    let c = mgr.open_tab("https://c.test", "C", false);

    let group = mgr.group_tabs(&[a, c]).unwrap();
    let members: Vec<_> = mgr.tabs_in_group(group).iter().map(|t| t.id).collect();
    assert_eq!(members, vec![a, c]);
    assert_eq!(mgr.get_tab(b).unwrap().group_id, None);
}

#[test]
fn test_group_tabs_rejects_empty_list() {
    let mut mgr = TabManager::new();
    assert!(matches!(mgr.group_tabs(&[]), Err(HostError::InvalidRequest(_))));
}

#[test]
fn test_group_tabs_with_unknown_id_fails_whole_call() {
    let mut mgr = TabManager::new();
    let a = mgr.open_tab("https://a.test", "A", true);
    assert_eq!(mgr.group_tabs(&[a, 99]), Err(HostError::TabNotFound(99)));
    assert!(mgr.query_groups().is_empty());
    assert_eq!(mgr.get_tab(a).unwrap().group_id, None);
}

#[test]
fn test_update_group_applies_only_given_fields() {
    let mut mgr = TabManager::new();
    let a = mgr.open_tab("https://a.test", "A", true);
    let group = mgr.group_tabs(&[a]).unwrap();

    let updated = mgr
        .update_group(group, &GroupUpdate { title: Some("Work".to_string()), color: Some(GroupColor::Blue), collapsed: None })
        .unwrap();
    assert_eq!(updated.title, "Work");
    assert_eq!(updated.color, GroupColor::Blue);
    assert!(!updated.collapsed);

    let updated = mgr
        .update_group(group, &GroupUpdate { collapsed: Some(true), ..GroupUpdate::default() })
        .unwrap();
    assert_eq!(updated.title, "Work");
    assert!(updated.collapsed);
}

#[test]
fn test_update_unknown_group_fails() {
    let mut mgr = TabManager::new();
    let result = mgr.update_group(5, &GroupUpdate::default());
    assert_eq!(result.unwrap_err(), HostError::GroupNotFound(5));
}

#[test]
fn test_remove_tabs_reports_missing_ids() {
    let mut mgr = TabManager::new();
    let a = mgr.open_tab("https://a.test", "A", true);
    let b = mgr.open_tab("https://b.test", "B", false);

    let failures = mgr.remove_tabs(&[a, 77]);
    assert_eq!(failures, vec![(77, HostError::TabNotFound(77))]);
    assert_eq!(mgr.tab_count(), 1);
    assert_eq!(mgr.get_active_tab().unwrap().id, b);
}

#[test]
fn test_group_survives_last_member_removal() {
    let mut mgr = TabManager::new();
    let a = mgr.open_tab("https://a.test", "A", true);
    let group = mgr.group_tabs(&[a]).unwrap();
    mgr.remove_tabs(&[a]);
    assert_eq!(mgr.query_groups().len(), 1);
    assert!(mgr.tabs_in_group(group).is_empty());
}

#[test]
fn test_tab_ids_are_not_reused_within_a_session() {
    let mut mgr = TabManager::new();
    let a = mgr.open_tab("https://a.test", "A", true);
    mgr.remove_tabs(&[a]);
    let b = mgr.open_tab("https://b.test", "B", true);
    assert_ne!(a, b);
}
