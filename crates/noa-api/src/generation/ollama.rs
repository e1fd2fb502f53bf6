//! Streaming client for the Ollama `/api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::extract::extract_cli_block;
use super::stream::{accumulate, fragments};
use super::{Generation, Generator};

/// Configuration for the Ollama backend.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Ollama API base URL.
    #[serde(default = "default_host")]
    pub host: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Whole-request timeout in seconds, per attempt.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Total attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Pause between attempts in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "mistral".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    2000
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Why one attempt failed.
#[derive(Debug)]
enum AttemptError {
    /// Connection, timeout, body stream or 5xx failure. Worth retrying.
    Transient(String),
    /// Any other non-success status.
    Rejected(reqwest::StatusCode),
}

/// Client for a local or remote Ollama server.
pub struct OllamaClient {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    async fn attempt(&self, prompt: &str) -> Result<String, AttemptError> {
        let url = format!("{}/api/generate", self.config.host.trim_end_matches('/'));
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AttemptError::Transient(format!("server returned {status}")));
        }
        if !status.is_success() {
            return Err(AttemptError::Rejected(status));
        }

        accumulate(fragments(response.bytes_stream()))
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Generation {
        tracing::debug!(model = %self.config.model, prompt = %prompt, "sending prompt");

        let max_attempts = self.config.max_attempts.max(1);
        let delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut text = None;

        for attempt in 1..=max_attempts {
            match self.attempt(prompt).await {
                Ok(full) => {
                    text = Some(full);
                    break;
                }
                Err(AttemptError::Rejected(status)) => {
                    tracing::warn!(status = %status, "ollama rejected generate request");
                    return Generation::Unreachable;
                }
                Err(AttemptError::Transient(error)) => {
                    tracing::warn!(attempt, max_attempts, error = %error, "ollama attempt failed");
                    if attempt < max_attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let Some(full) = text else {
            tracing::error!(max_attempts, "ollama unreachable, giving up");
            return Generation::Unreachable;
        };

        tracing::debug!(response = %full, "raw generation output");
        if full.is_empty() {
            return Generation::Empty;
        }
        Generation::Config(extract_cli_block(&full))
    }

    fn backend_name(&self) -> &str {
        "ollama"
    }
}
