//! Append-only feedback log and feedback-weighted history queries.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use noa_protocol::feedback::{FeedbackLogEntry, feedback_score};
use noa_protocol::staging::{StagingRecord, StagingStatus};

use super::staging;

#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedbackRow {
    id: i64,
    request_id: i64,
    status: String,
    prompt: String,
    generated_config: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<FeedbackRow> for FeedbackLogEntry {
    type Error = sqlx::Error;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<StagingStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Self {
            id: row.id,
            request_id: row.request_id,
            status,
            prompt: row.prompt,
            generated_config: row.generated_config,
            timestamp: row.timestamp,
        })
    }
}

/// Append one entry for a staging record.
pub async fn append(
    pool: &SqlitePool,
    request_id: i64,
    status: StagingStatus,
    prompt: &str,
    generated_config: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO feedback_log (request_id, status, prompt, generated_config, timestamp)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(request_id)
    .bind(status.as_str())
    .bind(prompt)
    .bind(generated_config)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// All entries for one record, oldest first.
pub async fn for_request(
    pool: &SqlitePool,
    request_id: i64,
) -> Result<Vec<FeedbackLogEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, FeedbackRow>(
        "SELECT * FROM feedback_log WHERE request_id = ? ORDER BY id",
    )
    .bind(request_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(FeedbackLogEntry::try_from).collect()
}

/// Prompt recorded most recently for a record, if any.
pub async fn latest_prompt(
    pool: &SqlitePool,
    request_id: i64,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT prompt FROM feedback_log WHERE request_id = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await
}

async fn latest_status(
    pool: &SqlitePool,
    request_id: i64,
) -> Result<Option<StagingStatus>, sqlx::Error> {
    let status = sqlx::query_scalar::<_, String>(
        "SELECT status FROM feedback_log WHERE request_id = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;
    status
        .map(|s| s.parse::<StagingStatus>())
        .transpose()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// A staged record ranked by the outcome recorded for it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct WeightedRecord {
    pub score: u8,
    /// Status the score was derived from.
    pub feedback_status: StagingStatus,
    pub record: StagingRecord,
}

/// Matching staged records ranked by feedback score, best first.
///
/// A record is scored by its latest feedback entry, falling back to its own
/// status when it has none. Equal scores keep newest-first order.
pub async fn query_weighted(
    pool: &SqlitePool,
    vendor: &str,
    model: &str,
    os_version: &str,
    feature: &str,
) -> Result<Vec<WeightedRecord>, sqlx::Error> {
    let records = staging::find_matching(pool, vendor, model, os_version, feature).await?;

    let mut weighted = Vec::with_capacity(records.len());
    for record in records {
        let feedback_status = latest_status(pool, record.id)
            .await?
            .unwrap_or(record.status);
        weighted.push(WeightedRecord {
            score: feedback_score(feedback_status),
            feedback_status,
            record,
        });
    }
    weighted.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(weighted)
}
