//! Staging queue review endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use noa_protocol::feedback::FeedbackLogEntry;
use noa_protocol::staging::{StagingRecord, StagingStatus};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::review;
use crate::state::AppState;

/// Query parameters for listing staged configs.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

/// A record after a push attempt.
#[derive(Debug, Serialize)]
pub struct PushResponse {
    #[serde(flatten)]
    pub record: StagingRecord,
    pub pushed: bool,
}

/// GET /api/v1/staging: list staged configs, newest first.
pub async fn list_staging(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<StagingRecord>>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<StagingStatus>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        ),
    };
    let records = db::staging::list(state.pool(), status).await?;
    Ok(Json(records))
}

/// GET /api/v1/staging/{id}: one staged config.
pub async fn get_staging(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StagingRecord>> {
    db::staging::get(state.pool(), id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Config request {id} not found.")))
}

/// POST /api/v1/staging/{id}/push (and /approve): push to the device.
pub async fn push_staging(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PushResponse>> {
    let (record, pushed) =
        review::push_record(state.pool(), state.push.as_ref(), &state.credentials, id).await?;
    Ok(Json(PushResponse { record, pushed }))
}

/// POST /api/v1/staging/{id}/reject: reject a staged config.
pub async fn reject_staging(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<StagingRecord>> {
    let record = review::reject_record(state.pool(), id).await?;
    Ok(Json(record))
}

/// GET /api/v1/staging/{id}/feedback: feedback log of one record.
pub async fn get_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<FeedbackLogEntry>>> {
    if db::staging::get(state.pool(), id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Config request {id} not found.")));
    }
    let entries = db::feedback::for_request(state.pool(), id).await?;
    Ok(Json(entries))
}
