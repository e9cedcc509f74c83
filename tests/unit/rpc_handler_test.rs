//! Unit tests for the RPC handler: the JSON-RPC methods dispatched by `handle_method`.
//!
//! These tests exercise the methods through the same code path used by the
//! real `tabloop-rpc` binary, using a temporary on-disk SQLite database and
//! settings file.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::Mutex;

use tabloop::app::App;
use tabloop::rpc_handler::handle_method;
use tabloop::services::language_model::LanguageModel;
use tabloop::types::errors::ModelError;

struct FixedModel(String);

#[async_trait]
impl LanguageModel for FixedModel {
    async fn prompt(&self, _prompt: &str) -> Result<String, ModelError> {
        Ok(self.0.clone())
    }

    async fn rewrite(
        &self,
        text: &str,
        _options: &tabloop::services::language_model::RewriteOptions,
    ) -> Result<String, ModelError> {
        Ok(format!("Polished: {}", text))
    }
}

/// Create a fresh App backed by a temp directory DB and settings file.
fn setup(model_reply: Option<&str>) -> (Mutex<App>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db_path = tmp.path().join("test.db");
    let settings_path = tmp.path().join("settings.json").to_string_lossy().to_string();
    let mut app = App::new(db_path.to_str().unwrap(), Some(settings_path)).expect("Failed to init App");
    if let Some(reply) = model_reply {
        app.set_model(Arc::new(FixedModel(reply.to_string())));
    }
    (Mutex::new(app), tmp)
}

async fn call(app: &Mutex<App>, method: &str, params: Value) -> Value {
    handle_method(app, method, &params)
        .await
        .unwrap_or_else(|e| panic!("{} failed: {}", method, e))
}

// ─── Ping ───

#[tokio::test]
async fn test_ping() {
    let (app, _tmp) = setup(None);
    assert_eq!(call(&app, "ping", json!({})).await, json!({"pong": true}));
}

#[tokio::test]
async fn test_unknown_method_returns_error() {
    let (app, _tmp) = setup(None);
    let res = handle_method(&app, "nonexistent.method", &json!({})).await;
    assert!(res.unwrap_err().contains("unknown method"));
}

// ─── Tabs ───

#[tokio::test]
async fn test_tab_open_and_list() {
    let (app, _tmp) = setup(None);
    let opened = call(&app, "tab.open", json!({"url": "https://a.test", "title": "A"})).await;
    let id = opened["id"].as_i64().unwrap();

    let tabs = call(&app, "tab.list", json!({})).await;
    assert_eq!(tabs.as_array().unwrap().len(), 1);
    assert_eq!(tabs[0]["id"], id);
    assert_eq!(tabs[0]["status"], "loading");
    assert_eq!(tabs[0]["groupId"], Value::Null);
}

#[tokio::test]
async fn test_tab_open_requires_url() {
    let (app, _tmp) = setup(None);
    let err = handle_method(&app, "tab.open", &json!({"title": "x"})).await.unwrap_err();
    assert_eq!(err, "missing url");
}

#[tokio::test]
async fn test_tab_methods_require_tab_id() {
    let (app, _tmp) = setup(None);
    for method in ["tab.update", "tab.activate", "tab.remove", "content.page", "nudge.run"] {
        let err = handle_method(&app, method, &json!({})).await.unwrap_err();
        assert_eq!(err, "missing tab_id", "{}", method);
    }
}

#[tokio::test]
async fn test_load_complete_snapshots_reported_document() {
    let (app, _tmp) = setup(None);
    let id = call(&app, "tab.open", json!({"url": "https://youtube.com/watch?v=1", "title": "Talk"})).await["id"]
        .as_i64()
        .unwrap();

    let detected = call(
        &app,
        "content.page",
        json!({"tab_id": id, "document": {"elements": [{"tag": "video", "currentTime": 45.0, "paused": true}], "innerHeight": 900}}),
    )
    .await;
    assert_eq!(detected, json!({"action": "RESUME_VIDEO", "videoTime": 45}));

    let updated = call(&app, "tab.update", json!({"tab_id": id, "status": "complete"})).await;
    assert_eq!(updated["tab"]["status"], "complete");
    assert_eq!(updated["snapshot"]["videoTime"], 45);

    let stored = call(&app, "snapshot.get", json!({"tab_id": id})).await;
    assert_eq!(stored["title"], "Talk");
    assert_eq!(call(&app, "snapshot.get", json!({})).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_navigation_drops_previous_page_document() {
    let (app, _tmp) = setup(None);
    let id = call(&app, "tab.open", json!({"url": "https://mail.test/compose", "title": "Mail"})).await["id"]
        .as_i64()
        .unwrap();
    let draft_doc = json!({"elements": [
        {"tag": "div", "role": "textbox", "contentEditable": true, "innerText": "Dear recruiter"}
    ]});
    let detected = call(&app, "content.page", json!({"tab_id": id, "document": draft_doc})).await;
    assert_eq!(detected["action"], "SEND_EMAIL");

    let updated = call(
        &app,
        "tab.update",
        json!({"tab_id": id, "url": "https://news.test/home", "title": "News", "status": "complete"}),
    )
    .await;
    assert_eq!(updated["snapshot"], Value::Null);
    assert_eq!(call(&app, "snapshot.get", json!({"tab_id": id})).await, Value::Null);

    call(&app, "content.page", json!({"tab_id": id, "document": {"bodyText": "headlines"}})).await;
    let updated = call(&app, "tab.update", json!({"tab_id": id, "status": "complete"})).await;
    assert_eq!(updated["snapshot"]["url"], "https://news.test/home");
    assert_eq!(updated["snapshot"]["draft"], Value::Null);
    assert_eq!(updated["snapshot"]["action"], Value::Null);
}

#[tokio::test]
async fn test_detector_settings_take_effect_immediately() {
    let (app, _tmp) = setup(None);
    let id = call(&app, "tab.open", json!({"url": "https://youtube.com/watch?v=1", "title": "Talk"})).await["id"]
        .as_i64()
        .unwrap();
    let video_doc = json!({"elements": [{"tag": "video", "currentTime": 45.0, "paused": true}], "innerHeight": 900});

    call(&app, "settings.set", json!({"key": "detector.video_min_seconds", "value": 100.0})).await;

    let detected = call(&app, "content.page", json!({"tab_id": id, "document": video_doc})).await;
    assert_eq!(detected, json!({}));
    let updated = call(&app, "tab.update", json!({"tab_id": id, "status": "complete"})).await;
    assert_eq!(updated["snapshot"]["videoTime"], Value::Null);
}

#[tokio::test]
async fn test_activation_of_internal_page_stores_nothing() {
    let (app, _tmp) = setup(None);
    let id = call(&app, "tab.open", json!({"url": "about:blank"})).await["id"].as_i64().unwrap();
    let res = call(&app, "tab.activate", json!({"tab_id": id})).await;
    assert_eq!(res["snapshot"], Value::Null);
    assert_eq!(call(&app, "snapshot.get", json!({"tab_id": id})).await, Value::Null);
}

#[tokio::test]
async fn test_content_state_push_is_stored() {
    let (app, _tmp) = setup(None);
    let id = call(&app, "tab.open", json!({"url": "https://mail.test", "title": "Mail"})).await["id"]
        .as_i64()
        .unwrap();
    let res = call(
        &app,
        "content.state",
        json!({"tab_id": id, "message": {"type": "STATE", "state": {"action": "SEND_EMAIL", "draft": "Hi"}}}),
    )
    .await;
    assert_eq!(res, json!({"stored": true}));
    assert_eq!(call(&app, "snapshot.get", json!({"tab_id": id})).await["draft"], "Hi");
}

// ─── Organize and nudges ───

#[tokio::test]
async fn test_organize_then_nudge() {
    let reply = r#"{"groups":[{"name":"Work","tabIds":[1,2],"keepOpen":[1]}],"preserved":[{"tabId":1,"reason":"PR draft"}]}"#;
    let (app, _tmp) = setup(Some(reply));
    call(&app, "tab.open", json!({"url": "https://github.com/o/r/pull/1", "title": "PR"})).await;
    call(&app, "tab.open", json!({"url": "https://docs.test", "title": "Docs"})).await;
    call(&app, "tab.open", json!({"url": "https://news.test", "title": "News"})).await;
    call(
        &app,
        "content.state",
        json!({"tab_id": 1, "message": {"type": "STATE", "state": {"action": "FINISH_PR", "draft": "fix nit"}}}),
    )
    .await;

    let outcome = call(&app, "organize", json!({})).await;
    assert_eq!(outcome["report"]["closed"], json!([2, 3]));
    assert_eq!(outcome["preserved"], json!(["PR → PR draft"]));

    let groups = call(&app, "group.list", json!({})).await;
    assert_eq!(groups[0]["title"], "Work");
    assert_eq!(groups[0]["tab_ids"], json!([1]));

    let pending = call(&app, "nudge.get", json!({})).await;
    assert_eq!(pending, json!([{"tab_id": 1, "title": "PR", "action": "FINISH_PR", "group_id": groups[0]["id"]}]));

    let nudge = call(&app, "nudge.run", json!({"tab_id": 1})).await;
    assert_eq!(nudge["text"], "Polished: fix nit");
    assert_eq!(nudge["state"], "closed");

    assert!(call(&app, "tab.list", json!({})).await.as_array().unwrap().is_empty());
    // The last member left, so the group was collapsed rather than deleted.
    let groups = call(&app, "group.list", json!({})).await;
    assert_eq!(groups[0]["collapsed"], true);
    assert_eq!(groups[0]["tab_ids"], json!([]));
}

#[tokio::test]
async fn test_organize_without_model_fails() {
    let (app, _tmp) = setup(None);
    call(&app, "settings.set", json!({"key": "model.endpoint", "value": ""})).await;
    call(&app, "tab.open", json!({"url": "https://a.test"})).await;

    let err = handle_method(&app, "organize", &json!({})).await.unwrap_err();
    assert!(err.contains("No language model configured"));
    assert_eq!(call(&app, "tab.list", json!({})).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tab_remove_reaps_empty_group() {
    let reply = r#"{"groups":[{"name":"Solo","tabIds":[1],"keepOpen":[1]}]}"#;
    let (app, _tmp) = setup(Some(reply));
    call(&app, "tab.open", json!({"url": "https://a.test"})).await;
    call(&app, "organize", json!({})).await;

    let res = call(&app, "tab.remove", json!({"tab_id": 1})).await;
    assert_eq!(res["collapsed_groups"].as_array().unwrap().len(), 1);
    assert!(handle_method(&app, "tab.remove", &json!({"tab_id": 1})).await.is_err());
}

// ─── Settings ───

#[tokio::test]
async fn test_settings_get_and_set() {
    let (app, _tmp) = setup(None);
    let settings = call(&app, "settings.get", json!({})).await;
    assert_eq!(settings["model"]["timeout_secs"], 25);

    call(&app, "settings.set", json!({"key": "model.timeout_secs", "value": 10})).await;
    let settings = call(&app, "settings.get", json!({})).await;
    assert_eq!(settings["model"]["timeout_secs"], 10);

    let err = handle_method(&app, "settings.set", &json!({"key": "model.nope", "value": 1})).await;
    assert!(err.is_err());
}
