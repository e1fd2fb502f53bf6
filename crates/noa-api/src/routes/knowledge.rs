//! Knowledge store endpoints: ingestion and retrieval.

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use noa_protocol::knowledge::NewKnowledgeEntry;
use noa_retrieval::MatchOutcome;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Result of inserting one entry.
#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub inserted: bool,
    pub id: Option<i64>,
}

/// Lookup key shared by search and history.
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub feature: String,
}

/// POST /api/v1/knowledge: insert one example, ignoring exact duplicates.
pub async fn insert_entry(
    State(state): State<AppState>,
    Json(entry): Json<NewKnowledgeEntry>,
) -> ApiResult<Json<InsertResponse>> {
    if entry.cli_block.trim().is_empty() {
        return Err(ApiError::BadRequest("cli_block must not be empty".into()));
    }
    let id = state.store().insert(&entry).await?;
    tracing::info!(
        vendor = %entry.vendor,
        feature = %entry.feature,
        inserted = id.is_some(),
        "knowledge entry ingested"
    );
    Ok(Json(InsertResponse {
        inserted: id.is_some(),
        id,
    }))
}

/// GET /api/v1/knowledge/search: exact-then-fuzzy retrieval.
pub async fn search(
    State(state): State<AppState>,
    Query(key): Query<KeyQuery>,
) -> ApiResult<Json<MatchOutcome>> {
    let outcome = state
        .pipeline
        .matcher
        .find(&key.vendor, &key.model, &key.os_version, &key.feature)
        .await?;
    Ok(Json(outcome))
}
