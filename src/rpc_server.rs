//! Tabloop RPC Server: JSON-RPC over stdin/stdout for the browser-side shim.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tab.open", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr; stdout carries only protocol lines.

use std::io::Write;
use std::time::Instant;

use log::{error, info};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use tabloop::app::App;
use tabloop::rpc_handler::handle_method;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn emit(line: &Value) {
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{}", line);
    let _ = out.flush();
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let db_path = match std::env::var("TABLOOP_DATA_DIR") {
        Ok(dir) => std::path::PathBuf::from(dir),
        Err(_) => tabloop::platform::get_data_dir(),
    };
    if let Err(e) = std::fs::create_dir_all(&db_path) {
        error!("Cannot create data directory {}: {}", db_path.display(), e);
        std::process::exit(1);
    }
    let db_path = db_path.join("tabloop.db");

    let mut app = match App::new(&db_path.to_string_lossy(), None) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize Tabloop: {}", e);
            std::process::exit(1);
        }
    };
    let Some(mut pushes) = app.take_state_receiver() else {
        error!("State receiver already taken");
        std::process::exit(1);
    };
    let app = Mutex::new(app);
    info!("Database at {}", db_path.display());

    emit(&json!({"event":"ready","version":env!("CARGO_PKG_VERSION")}));

    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(push) = pushes.recv() => {
                app.lock().await.apply_state_push(push);
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(l)) => l,
                    Ok(None) | Err(_) => break,
                };
                if line.trim().is_empty() { continue; }

                let req: Value = match serde_json::from_str(&line) {
                    Ok(v) => v,
                    Err(e) => {
                        emit(&json!({"id":null,"error":format!("parse error: {}",e)}));
                        continue;
                    }
                };

                let id = req.get("id").cloned().unwrap_or(Value::Null);

                if !rate_limiter.check() {
                    emit(&json!({"id": id, "error": "rate limit exceeded"}));
                    continue;
                }

                let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                let params = req.get("params").cloned().unwrap_or(json!({}));

                let response = match handle_method(&app, method, &params).await {
                    Ok(val) => json!({"id": id, "result": val}),
                    Err(err) => json!({"id": id, "error": err}),
                };
                emit(&response);
            }
        }
    }

    app.lock().await.shutdown();
}
