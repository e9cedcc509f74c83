//! RPC method handler for the Tabloop JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches a method call to the `App`: tab events, content
//! state, snapshots, organize runs, nudges and settings.

use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::app::App;
use crate::managers::kv_store::SqliteStore;
use crate::managers::snapshot_store::SnapshotStore;
use crate::managers::tab_manager::TabHost;
use crate::services::content_channel::{ContentMessage, StatePush};
use crate::services::nudge_engine::NudgeEngine;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::types::snapshot::PageDocument;
use crate::types::tab::{TabId, TabStatus};

fn tab_id_param(params: &Value) -> Result<TabId, String> {
    params
        .get("tab_id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| "missing tab_id".to_string())
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub async fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Tabs ───
        "tab.open" => {
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            let title = params.get("title").and_then(|v| v.as_str()).unwrap_or("");
            let active = params.get("active").and_then(|v| v.as_bool()).unwrap_or(false);
            let mut a = app.lock().await;
            let id = a.open_tab(url, title, active);
            Ok(json!({"id": id}))
        }
        "tab.update" => {
            let tab_id = tab_id_param(params)?;
            let url = params.get("url").and_then(|v| v.as_str());
            let title = params.get("title").and_then(|v| v.as_str());
            let status = match params.get("status") {
                Some(v) => Some(
                    serde_json::from_value::<TabStatus>(v.clone()).map_err(|e| e.to_string())?,
                ),
                None => None,
            };
            let mut a = app.lock().await;
            let (tab, saved) = a
                .update_tab(tab_id, url, title, status)
                .await
                .map_err(|e| e.to_string())?;
            Ok(json!({"tab": tab, "snapshot": saved}))
        }
        "tab.activate" => {
            let tab_id = tab_id_param(params)?;
            let mut a = app.lock().await;
            let saved = a.activate_tab(tab_id).await.map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "snapshot": saved}))
        }
        "tab.remove" => {
            let tab_id = tab_id_param(params)?;
            let mut a = app.lock().await;
            let collapsed = a.remove_tab(tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "collapsed_groups": collapsed}))
        }
        "tab.list" => {
            let a = app.lock().await;
            Ok(json!(a.tabs.query_tabs()))
        }
        "group.list" => {
            let a = app.lock().await;
            let groups: Vec<Value> = a
                .tabs
                .query_groups()
                .into_iter()
                .map(|g| {
                    let members: Vec<TabId> = a.tabs.tabs_in_group(g.id).iter().map(|t| t.id).collect();
                    json!({"id": g.id, "title": g.title, "color": g.color, "collapsed": g.collapsed, "tab_ids": members})
                })
                .collect();
            Ok(json!(groups))
        }

        // ─── Content side ───
        "content.page" => {
            let tab_id = tab_id_param(params)?;
            let doc_value = params.get("document").cloned().ok_or("missing document")?;
            let doc: PageDocument = serde_json::from_value(doc_value).map_err(|e| e.to_string())?;
            let a = app.lock().await;
            a.tabs.get_tab(tab_id).map_err(|e| e.to_string())?;
            let state = a.content.update_document(tab_id, doc);
            Ok(json!(state))
        }
        "content.state" => {
            let tab_id = tab_id_param(params)?;
            let message_value = params.get("message").cloned().ok_or("missing message")?;
            let message: ContentMessage =
                serde_json::from_value(message_value).map_err(|e| e.to_string())?;
            let a = app.lock().await;
            let saved = a.apply_state_push(StatePush { tab_id, message });
            Ok(json!({"stored": saved.is_some()}))
        }

        // ─── Snapshots ───
        "snapshot.get" => {
            let a = app.lock().await;
            let store = SqliteStore::new(a.db.connection());
            let snapshots = SnapshotStore::new(&store);
            match params.get("tab_id").and_then(|v| v.as_i64()) {
                Some(tab_id) => {
                    let saved = snapshots.get(tab_id).map_err(|e| e.to_string())?;
                    Ok(json!(saved))
                }
                None => {
                    let mut all: Vec<_> = snapshots.all().map_err(|e| e.to_string())?.into_values().collect();
                    all.sort_by_key(|s| s.id);
                    Ok(json!(all))
                }
            }
        }

        // ─── Organize ───
        "organize" => {
            let mut a = app.lock().await;
            let outcome = a.organize().await.map_err(|e| e.to_string())?;
            Ok(json!(outcome))
        }

        // ─── Nudges ───
        "nudge.get" => {
            let a = app.lock().await;
            let store = SqliteStore::new(a.db.connection());
            let pending = NudgeEngine::new(&store)
                .pending(&a.tabs)
                .map_err(|e| e.to_string())?;
            let arr: Vec<Value> = pending
                .iter()
                .map(|(tab, record)| json!({"tab_id": tab.id, "title": tab.title, "action": record.action, "group_id": record.group_id}))
                .collect();
            Ok(json!(arr))
        }
        "nudge.run" => {
            let tab_id = tab_id_param(params)?;
            let mut a = app.lock().await;
            let outcome = a.run_nudge(tab_id).await.map_err(|e| e.to_string())?;
            Ok(json!(outcome))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().await;
            serde_json::to_value(a.settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = app.lock().await;
            a.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            if key.starts_with("model.") {
                a.reload_model();
            }
            if key.starts_with("detector.") {
                a.reload_detector();
            }
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
