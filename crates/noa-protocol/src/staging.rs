use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review lifecycle of a staged configuration.
///
/// `Pending` is initial; the other three are outcomes of human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingStatus {
    Pending,
    Pushed,
    Rejected,
    Error,
}

impl StagingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Pushed => "pushed",
            Self::Rejected => "rejected",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for StagingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not one of the four known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown staging status: {0}")]
pub struct StatusParseError(pub String);

impl FromStr for StagingStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pushed" => Ok(Self::Pushed),
            "rejected" => Ok(Self::Rejected),
            "error" => Ok(Self::Error),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// A generated configuration awaiting (or past) human disposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingRecord {
    pub id: i64,
    pub vendor: String,
    pub model: String,
    pub os_version: String,
    pub feature: String,
    pub parameters: String,
    /// Set once at creation, never rewritten.
    pub generated_config: String,
    pub status: StagingStatus,
    pub device_ip: String,
    pub device_name: String,
    pub created_at: DateTime<Utc>,
}
