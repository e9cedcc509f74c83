use std::fmt;

use serde::Serialize;

use super::tab::{GroupId, TabId};

// === StorageError ===

/// Errors raised by the persistent key-value store.
#[derive(Debug)]
pub enum StorageError {
    /// Database operation failed.
    Database(String),
    /// A stored value could not be encoded or decoded.
    Serialization(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Database(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::Serialization(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

// === HostError ===

/// Errors returned by the tab / tab-group host API.
#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// Tab with the given ID is not open.
    TabNotFound(TabId),
    /// Tab group with the given ID does not exist.
    GroupNotFound(GroupId),
    /// The request was rejected by the host.
    InvalidRequest(String),
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::TabNotFound(id) => write!(f, "Tab not found: {}", id),
            HostError::GroupNotFound(id) => write!(f, "Tab group not found: {}", id),
            HostError::InvalidRequest(msg) => write!(f, "Invalid host request: {}", msg),
        }
    }
}

impl std::error::Error for HostError {}

// === SnapshotError ===

/// Errors from capturing and persisting a tab snapshot. Logged, never surfaced.
#[derive(Debug)]
pub enum SnapshotError {
    /// The tab is not an http(s) page.
    DetectionSkipped(String),
    /// Cross-context message delivery failed.
    SendFailed(String),
    /// The content side did not answer in time.
    Timeout(TabId),
    /// The tab could not be looked up.
    Host(HostError),
    /// Writing the snapshot failed.
    Storage(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::DetectionSkipped(url) => {
                write!(f, "Detection skipped for non-web page: {}", url)
            }
            SnapshotError::SendFailed(msg) => write!(f, "Message send failed: {}", msg),
            SnapshotError::Timeout(id) => write!(f, "Content state request timed out for tab {}", id),
            SnapshotError::Host(e) => write!(f, "Snapshot host error: {}", e),
            SnapshotError::Storage(msg) => write!(f, "Snapshot storage error: {}", msg),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<StorageError> for SnapshotError {
    fn from(e: StorageError) -> Self {
        SnapshotError::Storage(e.to_string())
    }
}

// === ModelError ===

/// Errors from the language-model collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// No model endpoint has been configured.
    NotConfigured,
    /// A network error occurred while communicating with the model.
    Network(String),
    /// The model endpoint returned an error.
    Api(String),
    /// The model response could not be read.
    Parse(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NotConfigured => write!(f, "No language model configured"),
            ModelError::Network(msg) => write!(f, "Model network error: {}", msg),
            ModelError::Api(msg) => write!(f, "Model API error: {}", msg),
            ModelError::Parse(msg) => write!(f, "Model response error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

// === PlanError ===

/// Errors that abort an organize run before any tab is touched.
#[derive(Debug)]
pub enum PlanError {
    /// The model did not answer within the timeout (seconds).
    ModelTimeout(u64),
    /// The model call itself failed.
    ModelInvocationFailed(String),
    /// The response was not valid JSON.
    PlanParseFailed(String),
    /// The response was JSON but did not match the plan shape.
    PlanShapeInvalid(String),
    /// Another organize run holds the run gate.
    AlreadyRunning,
    /// Reading the tab list failed.
    Host(String),
    /// Reading saved snapshots failed.
    Storage(String),
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::ModelTimeout(secs) => {
                write!(f, "Model timed out after {} seconds", secs)
            }
            PlanError::ModelInvocationFailed(msg) => {
                write!(f, "Model invocation failed: {}", msg)
            }
            PlanError::PlanParseFailed(msg) => write!(f, "Plan is not valid JSON: {}", msg),
            PlanError::PlanShapeInvalid(msg) => write!(f, "Plan has invalid shape: {}", msg),
            PlanError::AlreadyRunning => write!(f, "An organize run is already in progress"),
            PlanError::Host(msg) => write!(f, "Plan host error: {}", msg),
            PlanError::Storage(msg) => write!(f, "Plan storage error: {}", msg),
        }
    }
}

impl std::error::Error for PlanError {}

impl From<StorageError> for PlanError {
    fn from(e: StorageError) -> Self {
        PlanError::Storage(e.to_string())
    }
}

// === ExecutionFailure ===

/// A single isolated failure while applying a plan. Siblings still run.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionFailure {
    GroupingFailed { group: String, reason: String },
    CloseFailed { tab_id: TabId, reason: String },
    NudgeWriteFailed { tab_id: TabId, reason: String },
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionFailure::GroupingFailed { group, reason } => {
                write!(f, "Grouping failed for '{}': {}", group, reason)
            }
            ExecutionFailure::CloseFailed { tab_id, reason } => {
                write!(f, "Close failed for tab {}: {}", tab_id, reason)
            }
            ExecutionFailure::NudgeWriteFailed { tab_id, reason } => {
                write!(f, "Nudge write failed for tab {}: {}", tab_id, reason)
            }
        }
    }
}

impl std::error::Error for ExecutionFailure {}

// === NudgeError ===

/// Errors that prevent a nudge from running at all.
#[derive(Debug)]
pub enum NudgeError {
    /// No nudge record exists for the tab.
    NoPendingNudge(TabId),
    /// The tab is no longer open.
    TabNotOpen(TabId),
    /// Reading the nudge or snapshot failed.
    Storage(String),
    /// The text was presented but the tab could not be closed.
    CloseFailed(TabId, String),
}

impl fmt::Display for NudgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NudgeError::NoPendingNudge(id) => write!(f, "No pending nudge for tab {}", id),
            NudgeError::TabNotOpen(id) => write!(f, "Tab is not open: {}", id),
            NudgeError::Storage(msg) => write!(f, "Nudge storage error: {}", msg),
            NudgeError::CloseFailed(id, msg) => {
                write!(f, "Nudge could not close tab {}: {}", id, msg)
            }
        }
    }
}

impl std::error::Error for NudgeError {}

impl From<StorageError> for NudgeError {
    fn from(e: StorageError) -> Self {
        NudgeError::Storage(e.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
