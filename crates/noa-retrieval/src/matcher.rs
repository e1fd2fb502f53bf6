//! Exact-then-fuzzy retrieval of knowledge entries for a request.
//!
//! When the exact lookup misses, each key dimension is matched on its own
//! against the stored vocabulary and the results are tried from most to
//! least specific:
//!
//! 1. fuzzy vendor + model + os_version with the matched full feature name,
//! 2. fuzzy vendor with any feature containing the matched feature token,
//! 3. any feature containing the matched feature token.
//!
//! An empty outcome is a normal result, not an error.

use serde::Serialize;

use noa_protocol::knowledge::{KnowledgeEntry, KnowledgeField};

use crate::error::RetrievalResult;
use crate::normalize;
use crate::similarity::{DEFAULT_CUTOFF, close_match};
use crate::store::KnowledgeStore;

/// Which step of the retrieval cascade produced the entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    FuzzyFull,
    FuzzyVendorFeature,
    FuzzyFeature,
    NoMatch,
}

/// Result of a retrieval request.
#[derive(Debug, Clone, Serialize)]
pub struct MatchOutcome {
    pub strategy: MatchStrategy,
    pub entries: Vec<KnowledgeEntry>,
}

impl MatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// CLI blocks in retrieval order.
    pub fn cli_blocks(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.cli_block.as_str()).collect()
    }
}

/// Best feature token and the stored feature it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMatch {
    /// Lowercased underscore-delimited token, e.g. `vlan`.
    pub token: String,
    /// First stored feature exposing that token, e.g. `nxos_vlan_config`.
    pub feature: String,
}

/// Closest stored value per dimension; `None` when nothing crossed the cutoff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FuzzyCandidates {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub os_version: Option<String>,
    pub feature: Option<FeatureMatch>,
}

/// Stored vocabulary the fuzzy step draws its candidates from.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    pub vendors: Vec<String>,
    pub models: Vec<String>,
    pub os_versions: Vec<String>,
    /// Original (not lowercased) feature names, in first-seen order.
    pub features: Vec<String>,
}

impl Vocabulary {
    /// Map every lowercased feature token to the first feature exposing it.
    fn feature_tokens(&self) -> Vec<(String, &str)> {
        let mut tokens: Vec<(String, &str)> = Vec::new();
        for feature in &self.features {
            for token in feature.split('_') {
                let token = token.to_lowercase();
                if token.is_empty() || tokens.iter().any(|(t, _)| *t == token) {
                    continue;
                }
                tokens.push((token, feature.as_str()));
            }
        }
        tokens
    }

    /// Compute the closest candidate for each (already normalized) request field.
    pub fn candidates(
        &self,
        vendor: &str,
        model: &str,
        os_version: &str,
        feature: &str,
        cutoff: f32,
    ) -> FuzzyCandidates {
        let closest = |word: &str, pool: &[String]| {
            close_match(word, pool.iter().map(String::as_str), cutoff).map(str::to_string)
        };

        let tokens = self.feature_tokens();
        let feature = close_match(feature, tokens.iter().map(|(t, _)| t.as_str()), cutoff)
            .and_then(|best| {
                tokens
                    .iter()
                    .find(|(token, _)| token == best)
                    .map(|(token, full)| FeatureMatch {
                        token: token.clone(),
                        feature: (*full).to_string(),
                    })
            });

        FuzzyCandidates {
            vendor: closest(vendor, &self.vendors),
            model: closest(model, &self.models),
            os_version: closest(os_version, &self.os_versions),
            feature,
        }
    }
}

/// Exact-then-fuzzy matcher over a [`KnowledgeStore`].
#[derive(Debug, Clone)]
pub struct EntryMatcher {
    store: KnowledgeStore,
    cutoff: f32,
}

impl EntryMatcher {
    pub fn new(store: KnowledgeStore) -> Self {
        Self {
            store,
            cutoff: DEFAULT_CUTOFF,
        }
    }

    /// Override the similarity acceptance threshold.
    pub fn with_cutoff(mut self, cutoff: f32) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    /// Find examples for a request, degrading from exact to fuzzy matching.
    pub async fn find(
        &self,
        vendor: &str,
        model: &str,
        os_version: &str,
        feature: &str,
    ) -> RetrievalResult<MatchOutcome> {
        let vendor = normalize(vendor);
        let model = normalize(model);
        let os_version = normalize(os_version);
        let feature = normalize(feature);

        tracing::info!(
            vendor = %vendor,
            model = %model,
            os_version = %os_version,
            feature = %feature,
            "querying CLI examples"
        );

        let entries = self
            .store
            .lookup_exact(&vendor, &model, &os_version, &feature)
            .await?;
        if !entries.is_empty() {
            return Ok(MatchOutcome {
                strategy: MatchStrategy::Exact,
                entries,
            });
        }

        let vocabulary = self.vocabulary().await?;
        let candidates = vocabulary.candidates(&vendor, &model, &os_version, &feature, self.cutoff);
        tracing::info!(
            vendor_match = ?candidates.vendor,
            model_match = ?candidates.model,
            os_version_match = ?candidates.os_version,
            feature_match = ?candidates.feature.as_ref().map(|f| &f.feature),
            "fuzzy match candidates"
        );

        self.cascade(&candidates).await
    }

    /// Lowercased vendor/model/os_version universes plus original feature names.
    pub async fn vocabulary(&self) -> RetrievalResult<Vocabulary> {
        let lowered = |values: Vec<String>| -> Vec<String> {
            values.iter().map(|v| normalize(v)).collect()
        };
        Ok(Vocabulary {
            vendors: lowered(self.store.distinct(KnowledgeField::Vendor).await?),
            models: lowered(self.store.distinct(KnowledgeField::Model).await?),
            os_versions: lowered(self.store.distinct(KnowledgeField::OsVersion).await?),
            features: self.store.distinct(KnowledgeField::Feature).await?,
        })
    }

    async fn cascade(&self, candidates: &FuzzyCandidates) -> RetrievalResult<MatchOutcome> {
        let Some(feature) = &candidates.feature else {
            return Ok(no_match());
        };

        if let (Some(vendor), Some(model), Some(os_version)) =
            (&candidates.vendor, &candidates.model, &candidates.os_version)
        {
            let entries = self
                .store
                .lookup_with_feature(vendor, model, os_version, &feature.feature)
                .await?;
            if !entries.is_empty() {
                return Ok(MatchOutcome {
                    strategy: MatchStrategy::FuzzyFull,
                    entries,
                });
            }
        }

        if let Some(vendor) = &candidates.vendor {
            let entries = self
                .store
                .lookup_feature_containing(Some(vendor), &feature.token)
                .await?;
            if !entries.is_empty() {
                return Ok(MatchOutcome {
                    strategy: MatchStrategy::FuzzyVendorFeature,
                    entries,
                });
            }
        }

        let entries = self
            .store
            .lookup_feature_containing(None, &feature.token)
            .await?;
        if entries.is_empty() {
            return Ok(no_match());
        }
        Ok(MatchOutcome {
            strategy: MatchStrategy::FuzzyFeature,
            entries,
        })
    }
}

fn no_match() -> MatchOutcome {
    MatchOutcome {
        strategy: MatchStrategy::NoMatch,
        entries: Vec::new(),
    }
}
