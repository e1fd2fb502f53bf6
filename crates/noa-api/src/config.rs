//! API server configuration, loadable from TOML with environment overrides.

use serde::Deserialize;

use crate::generation::ollama::OllamaConfig;
use crate::push::command::PushConfig;

/// Top-level API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Listen address (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Generation backend settings.
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Basic-auth credentials guarding the API.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Device push settings.
    #[serde(default)]
    pub push: PushConfig,
    /// Feedback-weighted example selection.
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// HTTP Basic credentials for the review UI and API.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

/// Controls whether previously staged configs are fed back into prompts.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Maximum number of historical configs appended to a prompt.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_path() -> String {
    "noa.db".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "changeme".to_string()
}

fn default_max_examples() -> usize {
    2
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_examples: default_max_examples(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            ollama: OllamaConfig::default(),
            auth: AuthConfig::default(),
            push: PushConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from an optional file, then apply process environment overrides.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("NOA_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("NOA_PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(path) = lookup("NOA_DATABASE") {
            self.database_path = path;
        }
        if let Some(host) = lookup("OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.ollama.model = model;
        }
        if let Some(password) = lookup("UI_PASSWORD") {
            self.auth.password = password;
        }
        if let Some(program) = lookup("NOA_PUSH_PROGRAM") {
            self.push.program = Some(program);
        }
        if let Some(username) = lookup("SSH_USERNAME") {
            self.push.username = Some(username);
        }
        if let Some(password) = lookup("SSH_PASSWORD") {
            self.push.password = Some(password);
        }
        if let Some(enabled) = lookup("NOA_FEEDBACK_WEIGHTING") {
            self.feedback.enabled = enabled.eq_ignore_ascii_case("true") || enabled == "1";
        }
    }
}
