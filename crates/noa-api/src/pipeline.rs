//! The retrieval → prompt → generation → staging pipeline.
//!
//! Every entry point (webhook, direct generation, preview) goes through
//! [`PipelineContext`], which owns the handles each step needs.

use std::sync::Arc;

use sqlx::SqlitePool;

use noa_protocol::feedback::feedback_score;
use noa_protocol::request::ConfigRequest;
use noa_protocol::staging::StagingStatus;
use noa_retrieval::{EntryMatcher, MatchStrategy, RetrievalError};

use crate::config::FeedbackConfig;
use crate::db;
use crate::generation::{Generation, Generator, is_generation_failure};
use crate::prompt::build_prompt;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no CLI examples for vendor {vendor:?} and feature {feature:?}")]
    NoExamples { vendor: String, feature: String },

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Examples selected for one request.
#[derive(Debug, Clone)]
pub struct Examples {
    pub strategy: MatchStrategy,
    /// Knowledge examples followed by any feedback-weighted history.
    pub blocks: Vec<String>,
    /// How many of `blocks` came from staging history.
    pub from_history: usize,
}

/// Outcome of a generation that was not staged.
#[derive(Debug, Clone)]
pub struct Preview {
    pub examples: Examples,
    pub prompt: String,
    pub generation: Generation,
}

/// Outcome of a generation that was staged.
#[derive(Debug, Clone)]
pub struct Staged {
    pub id: i64,
    pub prompt: String,
    pub generation: Generation,
}

/// Handles shared by every pipeline run.
#[derive(Clone)]
pub struct PipelineContext {
    pub pool: SqlitePool,
    pub matcher: EntryMatcher,
    pub generator: Arc<dyn Generator>,
    pub feedback: FeedbackConfig,
}

impl PipelineContext {
    pub fn new(
        pool: SqlitePool,
        matcher: EntryMatcher,
        generator: Arc<dyn Generator>,
        feedback: FeedbackConfig,
    ) -> Self {
        Self {
            pool,
            matcher,
            generator,
            feedback,
        }
    }

    /// Retrieve examples for a request. An empty result is `NoExamples`.
    pub async fn examples(&self, request: &ConfigRequest) -> PipelineResult<Examples> {
        let outcome = self
            .matcher
            .find(&request.vendor, &request.model, &request.os_version, &request.feature)
            .await?;
        if outcome.is_empty() {
            tracing::warn!(
                vendor = %request.vendor,
                model = %request.model,
                feature = %request.feature,
                "no CLI examples found"
            );
            return Err(PipelineError::NoExamples {
                vendor: request.vendor.clone(),
                feature: request.feature.clone(),
            });
        }

        let mut blocks: Vec<String> = outcome
            .entries
            .into_iter()
            .map(|entry| entry.cli_block)
            .collect();
        let from_history = if self.feedback.enabled {
            self.append_history(request, &mut blocks).await?
        } else {
            0
        };

        tracing::info!(
            vendor = %request.vendor,
            feature = %request.feature,
            strategy = ?outcome.strategy,
            examples = blocks.len(),
            from_history,
            "examples selected"
        );
        Ok(Examples {
            strategy: outcome.strategy,
            blocks,
            from_history,
        })
    }

    /// Append well-scored staged configs for the same key. Returns how many were added.
    async fn append_history(
        &self,
        request: &ConfigRequest,
        blocks: &mut Vec<String>,
    ) -> PipelineResult<usize> {
        let history = db::feedback::query_weighted(
            &self.pool,
            &request.vendor,
            &request.model,
            &request.os_version,
            &request.feature,
        )
        .await?;

        let floor = feedback_score(StagingStatus::Rejected);
        let mut added = 0;
        for weighted in history {
            if added >= self.feedback.max_examples {
                break;
            }
            let config = weighted.record.generated_config;
            if weighted.score <= floor
                || is_generation_failure(&config)
                || blocks.iter().any(|b| b.trim() == config.trim())
            {
                continue;
            }
            blocks.push(config);
            added += 1;
        }
        Ok(added)
    }

    /// Retrieve, prompt and generate without staging anything.
    pub async fn preview(&self, request: &ConfigRequest) -> PipelineResult<Preview> {
        let examples = self.examples(request).await?;
        let prompt = build_prompt(&examples.blocks, request);
        let generation = self.generator.generate(&prompt).await;
        if generation.is_failure() {
            tracing::warn!(
                vendor = %request.vendor,
                model = %request.model,
                feature = %request.feature,
                backend = self.generator.backend_name(),
                outcome = generation.text(),
                "generation failed"
            );
        }
        Ok(Preview {
            examples,
            prompt,
            generation,
        })
    }

    /// Full pipeline: generate, then stage as `pending` and log the prompt.
    ///
    /// Generation failures are staged too, carrying their sentinel text.
    /// Once the record is staged the call succeeds, even if the prompt log
    /// entry cannot be written.
    pub async fn run(&self, request: &ConfigRequest) -> PipelineResult<Staged> {
        let Preview {
            prompt, generation, ..
        } = self.preview(request).await?;

        let id = db::staging::enqueue(&self.pool, request, generation.text()).await?;
        if let Err(e) = db::feedback::append(
            &self.pool,
            id,
            StagingStatus::Pending,
            &prompt,
            generation.text(),
        )
        .await
        {
            tracing::warn!(request_id = id, error = %e, "failed to log prompt for staged config");
        }

        tracing::info!(
            request_id = id,
            vendor = %request.vendor,
            model = %request.model,
            feature = %request.feature,
            device_ip = %request.device_ip,
            "config staged for review"
        );
        Ok(Staged {
            id,
            prompt,
            generation,
        })
    }
}
