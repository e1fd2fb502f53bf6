//! Retrieval of historical CLI examples for configuration generation.
//!
//! The [`KnowledgeStore`] holds `(vendor, model, os_version, feature) → cli_block`
//! examples in SQLite. The [`EntryMatcher`] answers a request with an exact
//! lookup first and, when that comes back empty, a similarity-based cascade
//! over the stored vocabulary.

pub mod error;
pub mod matcher;
pub mod similarity;
pub mod store;

pub use error::{RetrievalError, RetrievalResult};
pub use matcher::{EntryMatcher, FeatureMatch, FuzzyCandidates, MatchOutcome, MatchStrategy};
pub use store::KnowledgeStore;

/// Trim and lowercase a lookup key.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
