//! Model bridge.
//!
//! Carries `RUN_MODEL {prompt, id}` requests to a worker that owns the model
//! and broadcasts `MODEL_RESULT {id, result}` / `MODEL_ERROR {id, error}`
//! replies. Callers match replies on their correlation id and give up after
//! the timeout; a late reply is simply ignored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::services::language_model::LanguageModel;
use crate::types::errors::PlanError;

/// Messages on the bridge, tagged the way the page-context bridge tags them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeMessage {
    RunModel { prompt: String, id: u64 },
    ModelResult { id: u64, result: String },
    ModelError { id: u64, error: String },
}

pub struct ModelBridge {
    requests: mpsc::UnboundedSender<BridgeMessage>,
    replies: broadcast::Sender<BridgeMessage>,
    next_id: AtomicU64,
    worker: JoinHandle<()>,
}

impl ModelBridge {
    /// Starts the worker task. Must be called inside a tokio runtime.
    pub fn spawn(model: Arc<dyn LanguageModel>) -> Self {
        let (requests, mut inbox) = mpsc::unbounded_channel::<BridgeMessage>();
        let (replies, _) = broadcast::channel(16);

        let outbox = replies.clone();
        let worker = tokio::spawn(async move {
            while let Some(message) = inbox.recv().await {
                let BridgeMessage::RunModel { prompt, id } = message else {
                    continue;
                };
                let model = Arc::clone(&model);
                let outbox = outbox.clone();
                tokio::spawn(async move {
                    let reply = match model.prompt(&prompt).await {
                        Ok(result) => BridgeMessage::ModelResult { id, result },
                        Err(e) => BridgeMessage::ModelError { id, error: e.to_string() },
                    };
                    // No subscriber means the caller already gave up.
                    let _ = outbox.send(reply);
                });
            }
        });

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            requests,
            replies,
            next_id: AtomicU64::new(seed),
            worker,
        }
    }

    /// Strictly increasing correlation id.
    pub fn next_correlation_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends one prompt and waits for the reply carrying the same id.
    pub async fn run(&self, prompt: &str, timeout: Duration) -> Result<String, PlanError> {
        let mut replies = self.replies.subscribe();
        let id = self.next_correlation_id();

        self.requests
            .send(BridgeMessage::RunModel {
                prompt: prompt.to_string(),
                id,
            })
            .map_err(|_| PlanError::ModelInvocationFailed("model bridge is closed".to_string()))?;
        debug!("RUN_MODEL sent with id {}", id);

        let wait = async {
            loop {
                match replies.recv().await {
                    Ok(BridgeMessage::ModelResult { id: reply_id, result }) if reply_id == id => {
                        return Ok(result);
                    }
                    Ok(BridgeMessage::ModelError { id: reply_id, error }) if reply_id == id => {
                        return Err(PlanError::ModelInvocationFailed(error));
                    }
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Model bridge receiver lagged by {} replies", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => {
                        return Err(PlanError::ModelInvocationFailed(
                            "model bridge is closed".to_string(),
                        ));
                    }
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Model request {} timed out after {:?}", id, timeout);
                Err(PlanError::ModelTimeout(timeout.as_secs()))
            }
        }
    }
}

impl Drop for ModelBridge {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
