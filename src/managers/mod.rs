// Tabloop state managers
// Managers own stateful collaborators: the tab host, the key-value store and its two keyspaces.

pub mod kv_store;
pub mod nudge_store;
pub mod snapshot_store;
pub mod tab_manager;
