//! Language-model collaborator.
//!
//! `LanguageModel` is the seam every model call goes through: free-form
//! prompting for plans, plus rewrite and summarize transformations for nudges.
//! `HttpModelClient` talks to any OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::json;

use crate::types::errors::ModelError;
use crate::types::settings::ModelSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteTone {
    Professional,
    Casual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteLength {
    Shorter,
    Same,
    Longer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    pub tone: RewriteTone,
    pub length: RewriteLength,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    PlainText,
    Bullets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummarizeOptions {
    pub length: SummaryLength,
    pub format: SummaryFormat,
}

/// Trait defining the text-generation collaborator.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn prompt(&self, prompt: &str) -> Result<String, ModelError>;

    async fn rewrite(&self, text: &str, options: &RewriteOptions) -> Result<String, ModelError> {
        self.prompt(&rewrite_instruction(text, options)).await
    }

    async fn summarize(&self, text: &str, options: &SummarizeOptions) -> Result<String, ModelError> {
        self.prompt(&summarize_instruction(text, options)).await
    }
}

fn rewrite_instruction(text: &str, options: &RewriteOptions) -> String {
    let tone = match options.tone {
        RewriteTone::Professional => "a professional",
        RewriteTone::Casual => "a casual",
    };
    let length = match options.length {
        RewriteLength::Shorter => "shorter than",
        RewriteLength::Same => "about the same length as",
        RewriteLength::Longer => "longer than",
    };
    format!(
        "Rewrite the following text in {} tone, {} the original. Return only the rewritten text.\n\n{}",
        tone, length, text
    )
}

fn summarize_instruction(text: &str, options: &SummarizeOptions) -> String {
    let length = match options.length {
        SummaryLength::Short => "a short",
        SummaryLength::Medium => "a medium-length",
        SummaryLength::Long => "a detailed",
    };
    let format = match options.format {
        SummaryFormat::PlainText => "as plain prose",
        SummaryFormat::Bullets => "as a bulleted list",
    };
    format!(
        "Write {} summary of the following page, formatted {}. Return only the summary.\n\n{}",
        length, format, text
    )
}

/// OpenAI-compatible chat completions client.
pub struct HttpModelClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpModelClient {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Builds a client from settings, reading the API key from the configured env var.
    pub fn from_settings(settings: &ModelSettings) -> Result<Self, ModelError> {
        if settings.endpoint.trim().is_empty() {
            return Err(ModelError::NotConfigured);
        }
        let api_key = settings
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());
        Ok(Self::new(settings.endpoint.clone(), api_key, settings.model.clone()))
    }
}

#[async_trait]
impl LanguageModel for HttpModelClient {
    async fn prompt(&self, prompt: &str) -> Result<String, ModelError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        debug!("POST {} ({} prompt chars)", url, prompt.len());
        let response = request
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{}: {}", status, text)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ModelError::Parse(e.to_string()))?;

        json["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| ModelError::Parse("No message content in response".to_string()))
    }
}
