use serde::{Deserialize, Serialize};

/// Top-level organizer settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrganizerSettings {
    pub detector: DetectorSettings,
    pub model: ModelSettings,
    pub storage: StorageSettings,
}

/// Thresholds and timing for page-state detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectorSettings {
    pub interval_secs: u64,
    /// A paused video must be past this point to count as unfinished.
    pub video_min_seconds: f64,
    /// Scroll depth, in viewport heights, that marks an article as partially read.
    pub scroll_viewport_factor: f64,
    pub article_max_chars: usize,
    pub form_min_chars: usize,
    pub content_timeout_ms: u64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            video_min_seconds: 30.0,
            scroll_viewport_factor: 1.5,
            article_max_chars: 10_000,
            form_min_chars: 30,
            content_timeout_ms: 2_000,
        }
    }
}

/// Language-model endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSettings {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key, if any.
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
    /// Advisory only; embedded in the prompt, never enforced on the response.
    pub max_groups: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/v1".to_string(),
            model: "llama3.1".to_string(),
            api_key_env: None,
            timeout_secs: 25,
            max_groups: 8,
        }
    }
}

/// Snapshot/nudge store housekeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StorageSettings {
    /// Delete `tab_<id>` and `nudge_<id>` when a tab closes. Off by default.
    pub purge_on_tab_removed: bool,
}
