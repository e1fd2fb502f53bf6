//! Text generation for configuration blocks.
//!
//! A [`Generator`] turns a prompt into a [`Generation`]. Failures never
//! escape as errors: they come back as sentinel outcomes whose text is
//! still stageable but recognisable via [`is_generation_failure`].

pub mod extract;
pub mod ollama;
pub mod stream;

use async_trait::async_trait;

pub use extract::extract_cli_block;
pub use ollama::{OllamaClient, OllamaConfig};

/// Text returned when the backend could not be reached after all retries.
pub const UNREACHABLE_SENTINEL: &str = "Error: Unable to reach Ollama.";

/// Text returned when the backend answered with no usable fragments.
pub const EMPTY_SENTINEL: &str = "No response generated.";

/// Outcome of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// Extracted CLI block.
    Config(String),
    /// Transport failures on every attempt.
    Unreachable,
    /// The stream carried no text.
    Empty,
}

impl Generation {
    /// Text to stage: the config itself or the matching sentinel.
    pub fn text(&self) -> &str {
        match self {
            Self::Config(config) => config,
            Self::Unreachable => UNREACHABLE_SENTINEL,
            Self::Empty => EMPTY_SENTINEL,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Config(config) => config,
            other => other.text().to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Whether staged text is a generation-failure sentinel rather than a config.
pub fn is_generation_failure(text: &str) -> bool {
    text == UNREACHABLE_SENTINEL || text == EMPTY_SENTINEL
}

/// A text-generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a configuration block for the prompt.
    async fn generate(&self, prompt: &str) -> Generation;

    /// Backend name (for logging/audit).
    fn backend_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_texts() {
        assert_eq!(Generation::Unreachable.text(), UNREACHABLE_SENTINEL);
        assert_eq!(Generation::Empty.into_text(), EMPTY_SENTINEL);
        assert_eq!(Generation::Config("vlan 10".into()).text(), "vlan 10");
    }

    #[test]
    fn failure_detection() {
        assert!(Generation::Unreachable.is_failure());
        assert!(Generation::Empty.is_failure());
        assert!(!Generation::Config("x".into()).is_failure());
        assert!(is_generation_failure(UNREACHABLE_SENTINEL));
        assert!(is_generation_failure(EMPTY_SENTINEL));
        assert!(!is_generation_failure("vlan 10\n name Users"));
    }
}
