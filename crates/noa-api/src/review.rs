//! Human review of staged configs: push (approve) and reject.

use sqlx::SqlitePool;

use noa_protocol::staging::{StagingRecord, StagingStatus};

use crate::db;
use crate::generation::is_generation_failure;
use crate::push::{Credentials, PushGateway, PushTarget};

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("config request {0} not found")]
    NotFound(i64),

    #[error("config request {id} is {from} and cannot become {to}")]
    InvalidTransition {
        id: i64,
        from: StagingStatus,
        to: StagingStatus,
    },

    #[error("config request {0} holds a failed generation and cannot be pushed")]
    GenerationFailed(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type ReviewResult<T> = Result<T, ReviewError>;

/// Review actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Push,
    Reject,
}

/// Which statuses each review action may start from.
pub struct StatusPolicy;

impl StatusPolicy {
    /// Pending records and failed pushes are open for review; pushed and
    /// rejected records are closed.
    pub fn allows(action: ReviewAction, from: StagingStatus) -> bool {
        match action {
            ReviewAction::Push | ReviewAction::Reject => {
                matches!(from, StagingStatus::Pending | StagingStatus::Error)
            }
        }
    }

    fn check(record: &StagingRecord, action: ReviewAction, to: StagingStatus) -> ReviewResult<()> {
        if Self::allows(action, record.status) {
            Ok(())
        } else {
            Err(ReviewError::InvalidTransition {
                id: record.id,
                from: record.status,
                to,
            })
        }
    }
}

async fn load(pool: &SqlitePool, id: i64) -> ReviewResult<StagingRecord> {
    db::staging::get(pool, id)
        .await?
        .ok_or(ReviewError::NotFound(id))
}

/// Set the status and append the matching feedback entry.
async fn record_outcome(
    pool: &SqlitePool,
    record: &StagingRecord,
    status: StagingStatus,
) -> ReviewResult<StagingRecord> {
    if !db::staging::transition(pool, record.id, status).await? {
        return Err(ReviewError::NotFound(record.id));
    }
    let prompt = db::feedback::latest_prompt(pool, record.id)
        .await?
        .unwrap_or_default();
    db::feedback::append(pool, record.id, status, &prompt, &record.generated_config).await?;
    load(pool, record.id).await
}

/// Push a staged config to its device. The record ends up `pushed` or
/// `error`; the returned flag says which.
pub async fn push_record(
    pool: &SqlitePool,
    gateway: &dyn PushGateway,
    credentials: &Credentials,
    id: i64,
) -> ReviewResult<(StagingRecord, bool)> {
    let record = load(pool, id).await?;
    StatusPolicy::check(&record, ReviewAction::Push, StagingStatus::Pushed)?;
    if is_generation_failure(&record.generated_config) {
        return Err(ReviewError::GenerationFailed(id));
    }

    let target = PushTarget {
        device_ip: record.device_ip.clone(),
        device_name: record.device_name.clone(),
        vendor: record.vendor.clone(),
        model: record.model.clone(),
    };
    let pushed = gateway
        .push(&target, credentials, &record.generated_config)
        .await;
    let status = if pushed {
        StagingStatus::Pushed
    } else {
        StagingStatus::Error
    };
    tracing::info!(
        request_id = id,
        device_ip = %target.device_ip,
        status = %status,
        "review push finished"
    );

    let updated = record_outcome(pool, &record, status).await?;
    Ok((updated, pushed))
}

/// Mark a staged config as rejected.
pub async fn reject_record(pool: &SqlitePool, id: i64) -> ReviewResult<StagingRecord> {
    let record = load(pool, id).await?;
    StatusPolicy::check(&record, ReviewAction::Reject, StagingStatus::Rejected)?;
    tracing::info!(request_id = id, "config rejected");
    record_outcome(pool, &record, StagingStatus::Rejected).await
}
