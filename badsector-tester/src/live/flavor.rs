//! Flavor-text backends for live runs.
use async_trait::async_trait;
use badsector_game::FlavorTextSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

use crate::common::lore::canned_line;

pub const ENDPOINT_ENV: &str = "BADSECTOR_FLAVOR_ENDPOINT";
pub const MODEL_ENV: &str = "BADSECTOR_FLAVOR_MODEL";
pub const API_KEY_ENV: &str = "BADSECTOR_FLAVOR_API_KEY";

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

fn default_model() -> String {
    "local-model".to_string()
}

const fn default_temperature() -> f32 {
    0.8
}

const fn default_timeout_ms() -> u64 {
    8_000
}

/// Where lore text comes from during live runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorConfig {
    /// Base URL of an OpenAI-compatible server. `None` keeps lore offline.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for FlavorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_model(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
            api_key: None,
        }
    }
}

impl FlavorConfig {
    /// Layer the `BADSECTOR_FLAVOR_*` environment variables on top.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(endpoint) = non_empty(ENDPOINT_ENV) {
            self.endpoint = Some(endpoint);
        }
        if let Some(model) = non_empty(MODEL_ENV) {
            self.model = model;
        }
        if let Some(key) = non_empty(API_KEY_ENV) {
            self.api_key = Some(key);
        }
        self
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Error)]
pub enum FlavorError {
    #[error("flavor request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("flavor backend answered {0}")]
    Status(reqwest::StatusCode),
    #[error("flavor backend returned no choices")]
    NoChoices,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}

impl ChatCompletionResponse {
    /// Text of the first choice.
    ///
    /// # Errors
    ///
    /// [`FlavorError::NoChoices`] when the backend sent nothing back.
    pub fn into_content(self) -> Result<String, FlavorError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(FlavorError::NoChoices)
    }
}

/// Full chat-completions URL for a configured endpoint.
#[must_use]
pub fn chat_url(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else if trimmed.ends_with("/v1") {
        format!("{trimmed}/chat/completions")
    } else {
        format!("{trimmed}{CHAT_COMPLETIONS_PATH}")
    }
}

/// Lore from an OpenAI-compatible chat-completions server.
pub struct ChatCompletionsSource {
    client: reqwest::Client,
    url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl ChatCompletionsSource {
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(endpoint: &str, config: &FlavorConfig) -> Result<Self, FlavorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            url: chat_url(endpoint),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key: config.api_key.clone(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// # Errors
    ///
    /// Transport failures, non-success statuses and empty answers.
    pub async fn complete(&self, prompt: &str) -> Result<String, FlavorError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
        };
        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FlavorError::Status(status));
        }
        response.json::<ChatCompletionResponse>().await?.into_content()
    }
}

#[async_trait]
impl FlavorTextSource for ChatCompletionsSource {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.complete(prompt).await?)
    }
}

/// Offline lore, cycling through canned lines.
#[derive(Debug, Default)]
pub struct CannedFlavor {
    next: AtomicUsize,
}

#[async_trait]
impl FlavorTextSource for CannedFlavor {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(canned_line(index).to_string())
    }
}

/// Pick the backend `config` asks for.
///
/// # Errors
///
/// Fails when a configured endpoint cannot get an HTTP client.
pub fn build_source(config: &FlavorConfig) -> anyhow::Result<Arc<dyn FlavorTextSource>> {
    match config.endpoint.as_deref() {
        Some(endpoint) => {
            let source = ChatCompletionsSource::new(endpoint, config)?;
            log::info!("flavor text from {} ({})", source.url(), config.model);
            Ok(Arc::new(source))
        }
        None => {
            log::info!("no flavor endpoint configured, using canned lore");
            Ok(Arc::new(CannedFlavor::default()))
        }
    }
}
