//! Feedback-weighted staging history.

use axum::Json;
use axum::extract::{Query, State};

use crate::db;
use crate::db::feedback::WeightedRecord;
use crate::error::ApiResult;
use crate::routes::knowledge::KeyQuery;
use crate::state::AppState;

/// GET /api/v1/history: matching staged records, best outcomes first.
pub async fn weighted_history(
    State(state): State<AppState>,
    Query(key): Query<KeyQuery>,
) -> ApiResult<Json<Vec<WeightedRecord>>> {
    let records = db::feedback::query_weighted(
        state.pool(),
        &key.vendor,
        &key.model,
        &key.os_version,
        &key.feature,
    )
    .await?;
    Ok(Json(records))
}
