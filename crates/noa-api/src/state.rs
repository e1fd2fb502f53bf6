//! Shared application state for the Axum server.

use std::sync::Arc;

use sqlx::SqlitePool;

use noa_retrieval::{EntryMatcher, KnowledgeStore};

use crate::config::{ApiConfig, AuthConfig, FeedbackConfig};
use crate::generation::Generator;
use crate::pipeline::PipelineContext;
use crate::push::{Credentials, PushGateway};

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    /// Retrieval, generation and staging handles.
    pub pipeline: PipelineContext,
    /// Device push boundary.
    pub push: Arc<dyn PushGateway>,
    /// Management credentials handed to the push gateway.
    pub credentials: Credentials,
    /// Basic-auth credentials guarding `/api/v1`.
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        generator: Arc<dyn Generator>,
        push: Arc<dyn PushGateway>,
        config: &ApiConfig,
    ) -> Self {
        Self::with_parts(
            pool,
            generator,
            push,
            Credentials::from(&config.push),
            config.auth.clone(),
            config.feedback.clone(),
        )
    }

    pub fn with_parts(
        pool: SqlitePool,
        generator: Arc<dyn Generator>,
        push: Arc<dyn PushGateway>,
        credentials: Credentials,
        auth: AuthConfig,
        feedback: FeedbackConfig,
    ) -> Self {
        let matcher = EntryMatcher::new(KnowledgeStore::new(pool.clone()));
        Self {
            pipeline: PipelineContext::new(pool, matcher, generator, feedback),
            push,
            credentials,
            auth,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pipeline.pool
    }

    pub fn store(&self) -> &KnowledgeStore {
        self.pipeline.matcher.store()
    }
}
