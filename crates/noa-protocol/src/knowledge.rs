use serde::{Deserialize, Serialize};

/// A stored historical CLI example, keyed by device attributes and feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: i64,
    pub vendor: String,
    pub model: String,
    pub os_version: String,
    pub feature: String,
    pub cli_block: String,
    /// Where the example came from (document name, import file).
    pub source: Option<String>,
}

/// An entry awaiting insertion into the knowledge store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKnowledgeEntry {
    pub vendor: String,
    pub model: String,
    pub os_version: String,
    pub feature: String,
    pub cli_block: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// One lookup dimension of the knowledge store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeField {
    Vendor,
    Model,
    OsVersion,
    Feature,
}

impl KnowledgeField {
    /// Column name in the `cli_library` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Vendor => "vendor",
            Self::Model => "model",
            Self::OsVersion => "os_version",
            Self::Feature => "feature",
        }
    }
}
