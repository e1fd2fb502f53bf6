use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::staging::StagingStatus;

/// Append-only audit entry recorded whenever a staged request changes hands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLogEntry {
    pub id: i64,
    /// Staging record this entry refers to.
    pub request_id: i64,
    pub status: StagingStatus,
    pub prompt: String,
    pub generated_config: String,
    pub timestamp: DateTime<Utc>,
}

/// Ranking weight of an outcome: successful pushes first, failed pushes last.
pub fn feedback_score(status: StagingStatus) -> u8 {
    match status {
        StagingStatus::Pushed => 3,
        StagingStatus::Pending => 2,
        StagingStatus::Rejected => 1,
        StagingStatus::Error => 0,
    }
}
