//! Generation endpoints: webhook intake, direct generation and preview.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use noa_protocol::request::{ConfigRequest, WebhookPayload};
use noa_retrieval::MatchStrategy;

use crate::error::ApiResult;
use crate::state::AppState;

/// Response for a staged generation.
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub status: &'static str,
    pub id: i64,
    pub vendor: String,
    pub model: String,
    pub feature: String,
    pub device_ip: String,
    pub device_name: String,
    pub generated_config: String,
}

/// Response for a preview generation.
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub generated_config: String,
    pub generation_failed: bool,
    pub strategy: MatchStrategy,
    pub examples: Vec<String>,
}

async fn stage(state: &AppState, request: ConfigRequest) -> ApiResult<Json<QueuedResponse>> {
    let staged = state.pipeline.run(&request).await?;
    Ok(Json(QueuedResponse {
        status: "queued",
        id: staged.id,
        vendor: request.vendor,
        model: request.model,
        feature: request.feature,
        device_ip: request.device_ip,
        device_name: request.device_name,
        generated_config: staged.generation.into_text(),
    }))
}

/// POST /api/v1/webhook: device-inventory style intake.
pub async fn webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> ApiResult<Json<QueuedResponse>> {
    let request = ConfigRequest::from(payload);
    tracing::info!(vendor = %request.vendor, feature = %request.feature, "webhook received");
    stage(&state, request).await
}

/// POST /api/v1/generate-config: generate and stage.
pub async fn generate_config(
    State(state): State<AppState>,
    Json(request): Json<ConfigRequest>,
) -> ApiResult<Json<QueuedResponse>> {
    stage(&state, request).await
}

/// POST /api/v1/preview: generate without staging.
pub async fn preview(
    State(state): State<AppState>,
    Json(request): Json<ConfigRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let preview = state.pipeline.preview(&request).await?;
    Ok(Json(PreviewResponse {
        generation_failed: preview.generation.is_failure(),
        generated_config: preview.generation.into_text(),
        strategy: preview.examples.strategy,
        examples: preview.examples.blocks,
    }))
}
