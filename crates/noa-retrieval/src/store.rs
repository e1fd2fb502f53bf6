//! SQLite-backed knowledge store of historical CLI examples.

use sqlx::SqlitePool;

use noa_protocol::knowledge::{KnowledgeEntry, KnowledgeField, NewKnowledgeEntry};

use crate::error::RetrievalResult;
use crate::normalize;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cli_library (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    vendor TEXT NOT NULL,
    model TEXT NOT NULL,
    os_version TEXT NOT NULL,
    feature TEXT NOT NULL,
    cli_block TEXT NOT NULL,
    source TEXT,
    vendor_key TEXT NOT NULL,
    model_key TEXT NOT NULL,
    os_version_key TEXT NOT NULL,
    feature_key TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cli_library_key
    ON cli_library (vendor_key, model_key, os_version_key, feature_key);
";

/// Knowledge row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct EntryRow {
    id: i64,
    vendor: String,
    model: String,
    os_version: String,
    feature: String,
    cli_block: String,
    source: Option<String>,
}

impl From<EntryRow> for KnowledgeEntry {
    fn from(row: EntryRow) -> Self {
        Self {
            id: row.id,
            vendor: row.vendor,
            model: row.model,
            os_version: row.os_version,
            feature: row.feature,
            cli_block: row.cli_block,
            source: row.source,
        }
    }
}

/// Read-mostly repository of `(vendor, model, os_version, feature) → cli_block` examples.
#[derive(Debug, Clone)]
pub struct KnowledgeStore {
    pool: SqlitePool,
}

impl KnowledgeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the `cli_library` table if it does not exist yet.
    pub async fn init(&self) -> RetrievalResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Insert an example unless an identical one is already stored.
    ///
    /// Identity is the exact (case-sensitive) tuple of vendor, model,
    /// os_version, feature and the trimmed CLI block. Returns the new row id,
    /// or `None` when the entry was a duplicate.
    ///
    /// The `*_key` columns hold the [`normalize`]d key fields; every
    /// case-insensitive lookup compares against them.
    pub async fn insert(&self, entry: &NewKnowledgeEntry) -> RetrievalResult<Option<i64>> {
        let cli_block = entry.cli_block.trim();
        let result = sqlx::query(
            "INSERT INTO cli_library (vendor, model, os_version, feature, cli_block, source,
                 vendor_key, model_key, os_version_key, feature_key)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10
             WHERE NOT EXISTS (
                 SELECT 1 FROM cli_library
                 WHERE vendor = ?1 AND model = ?2 AND os_version = ?3 AND feature = ?4
                   AND cli_block = ?5
             )",
        )
        .bind(&entry.vendor)
        .bind(&entry.model)
        .bind(&entry.os_version)
        .bind(&entry.feature)
        .bind(cli_block)
        .bind(&entry.source)
        .bind(normalize(&entry.vendor))
        .bind(normalize(&entry.model))
        .bind(normalize(&entry.os_version))
        .bind(normalize(&entry.feature))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(
                vendor = %entry.vendor,
                feature = %entry.feature,
                "duplicate knowledge entry skipped"
            );
            return Ok(None);
        }
        Ok(Some(result.last_insert_rowid()))
    }

    /// Case-insensitive exact match on all four key fields, in row order.
    pub async fn lookup_exact(
        &self,
        vendor: &str,
        model: &str,
        os_version: &str,
        feature: &str,
    ) -> RetrievalResult<Vec<KnowledgeEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT * FROM cli_library
             WHERE vendor_key = ? AND model_key = ? AND os_version_key = ? AND feature_key = ?
             ORDER BY id",
        )
        .bind(normalize(vendor))
        .bind(normalize(model))
        .bind(normalize(os_version))
        .bind(normalize(feature))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(KnowledgeEntry::from).collect())
    }

    /// Entries matching normalized vendor/model/os_version and the exact stored feature string.
    pub async fn lookup_with_feature(
        &self,
        vendor: &str,
        model: &str,
        os_version: &str,
        feature: &str,
    ) -> RetrievalResult<Vec<KnowledgeEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT * FROM cli_library
             WHERE vendor_key = ? AND model_key = ? AND os_version_key = ? AND feature = ?
             ORDER BY id",
        )
        .bind(normalize(vendor))
        .bind(normalize(model))
        .bind(normalize(os_version))
        .bind(feature)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(KnowledgeEntry::from).collect())
    }

    /// Entries whose normalized feature contains `token`, optionally restricted
    /// to one vendor (compared case-insensitively).
    pub async fn lookup_feature_containing(
        &self,
        vendor: Option<&str>,
        token: &str,
    ) -> RetrievalResult<Vec<KnowledgeEntry>> {
        let token = token.to_lowercase();
        let rows = match vendor {
            Some(vendor) => {
                sqlx::query_as::<_, EntryRow>(
                    "SELECT * FROM cli_library
                     WHERE vendor_key = ? AND instr(feature_key, ?) > 0
                     ORDER BY id",
                )
                .bind(normalize(vendor))
                .bind(&token)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, EntryRow>(
                    "SELECT * FROM cli_library WHERE instr(feature_key, ?) > 0 ORDER BY id",
                )
                .bind(&token)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(KnowledgeEntry::from).collect())
    }

    /// Distinct stored values of one field, in order of first insertion.
    pub async fn distinct(&self, field: KnowledgeField) -> RetrievalResult<Vec<String>> {
        let column = field.column();
        let sql = format!("SELECT {column} FROM cli_library GROUP BY {column} ORDER BY MIN(id)");
        let values = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    /// Total number of stored entries.
    pub async fn count(&self) -> RetrievalResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cli_library")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    pub(crate) async fn memory_store() -> KnowledgeStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = KnowledgeStore::new(pool);
        store.init().await.unwrap();
        store
    }

    pub(crate) fn entry(
        vendor: &str,
        model: &str,
        os_version: &str,
        feature: &str,
        cli_block: &str,
    ) -> NewKnowledgeEntry {
        NewKnowledgeEntry {
            vendor: vendor.into(),
            model: model.into(),
            os_version: os_version.into(),
            feature: feature.into(),
            cli_block: cli_block.into(),
            source: Some("unit-test".into()),
        }
    }

    #[tokio::test]
    async fn insert_is_idempotent() {
        let store = memory_store().await;
        let vlan = entry("Cisco", "Nexus 9000", "9.3(x)", "VLAN", "vlan 10\n name Users\n exit");

        let first = store.insert(&vlan).await.unwrap();
        assert!(first.is_some());

        let second = store.insert(&vlan).await.unwrap();
        assert!(second.is_none());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn insert_dedup_ignores_surrounding_whitespace() {
        let store = memory_store().await;
        store
            .insert(&entry("Cisco", "Nexus 9000", "9.3(x)", "VLAN", "vlan 10\n"))
            .await
            .unwrap();
        let dup = store
            .insert(&entry("Cisco", "Nexus 9000", "9.3(x)", "VLAN", "  vlan 10"))
            .await
            .unwrap();
        assert!(dup.is_none());

        let stored = store
            .lookup_exact("Cisco", "Nexus 9000", "9.3(x)", "VLAN")
            .await
            .unwrap();
        assert_eq!(stored[0].cli_block, "vlan 10");
    }

    #[tokio::test]
    async fn insert_dedup_is_case_sensitive() {
        let store = memory_store().await;
        store
            .insert(&entry("Cisco", "Nexus 9000", "9.3(x)", "VLAN", "vlan 10"))
            .await
            .unwrap();
        let other = store
            .insert(&entry("cisco", "Nexus 9000", "9.3(x)", "VLAN", "vlan 10"))
            .await
            .unwrap();
        assert!(other.is_some());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn lookup_exact_is_case_insensitive() {
        let store = memory_store().await;
        store
            .insert(&entry("Cisco", "Catalyst 9200", "IOS XE", "VLAN", "vlan 20\n name Voice"))
            .await
            .unwrap();
        store
            .insert(&entry("Cisco", "Catalyst 9200", "IOS XE", "NTP", "ntp server 10.0.0.1"))
            .await
            .unwrap();

        let upper = store
            .lookup_exact("Cisco", "Catalyst 9200", "IOS XE", "VLAN")
            .await
            .unwrap();
        let lower = store
            .lookup_exact("cisco", "catalyst 9200", "ios xe", "vlan")
            .await
            .unwrap();
        assert_eq!(upper.len(), 1);
        assert_eq!(upper, lower);
        assert_eq!(upper[0].cli_block, "vlan 20\n name Voice");
    }

    #[tokio::test]
    async fn lookup_exact_trims_input() {
        let store = memory_store().await;
        store
            .insert(&entry("Aruba", "CX 6300", "10.10", "VLAN", "vlan 30"))
            .await
            .unwrap();
        let found = store
            .lookup_exact("  Aruba ", "CX 6300", "10.10", " vlan")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn distinct_in_first_seen_order() {
        let store = memory_store().await;
        for (vendor, block) in [("Cisco", "a"), ("Aruba", "b"), ("Cisco", "c"), ("HPE", "d")] {
            store
                .insert(&entry(vendor, "m", "v", "VLAN", block))
                .await
                .unwrap();
        }
        let vendors = store.distinct(KnowledgeField::Vendor).await.unwrap();
        assert_eq!(vendors, vec!["Cisco", "Aruba", "HPE"]);
        let features = store.distinct(KnowledgeField::Feature).await.unwrap();
        assert_eq!(features, vec!["VLAN"]);
    }

    #[tokio::test]
    async fn feature_containing_with_and_without_vendor() {
        let store = memory_store().await;
        store
            .insert(&entry("Cisco", "Nexus 9000", "9.3(x)", "nxos_vlan_config", "vlan 10"))
            .await
            .unwrap();
        store
            .insert(&entry("Aruba", "CX 6300", "10.10", "VLAN", "vlan 30"))
            .await
            .unwrap();

        let cisco = store
            .lookup_feature_containing(Some("cisco"), "vlan")
            .await
            .unwrap();
        assert_eq!(cisco.len(), 1);
        assert_eq!(cisco[0].vendor, "Cisco");

        let any = store.lookup_feature_containing(None, "vlan").await.unwrap();
        assert_eq!(any.len(), 2);
    }

    #[tokio::test]
    async fn lookup_exact_folds_non_ascii_case() {
        let store = memory_store().await;
        store
            .insert(&entry("Öster", "Ünit 1", "1.0", "VLAN", "vlan 40"))
            .await
            .unwrap();

        let identical = store
            .lookup_exact("Öster", "Ünit 1", "1.0", "VLAN")
            .await
            .unwrap();
        let lowered = store
            .lookup_exact("öster", "ünit 1", "1.0", "vlan")
            .await
            .unwrap();
        assert_eq!(identical.len(), 1);
        assert_eq!(identical, lowered);
        assert_eq!(identical[0].vendor, "Öster");
    }

    #[tokio::test]
    async fn feature_containing_folds_non_ascii_case() {
        let store = memory_store().await;
        store
            .insert(&entry("Öster", "Ünit 1", "1.0", "ÜBER_VLAN", "vlan 40"))
            .await
            .unwrap();
        store
            .insert(&entry("Other", "Ünit 1", "1.0", "über_vlan", "vlan 41"))
            .await
            .unwrap();

        let scoped = store
            .lookup_feature_containing(Some("ÖSTER"), "über")
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].cli_block, "vlan 40");

        let any = store.lookup_feature_containing(None, "ÜBER").await.unwrap();
        assert_eq!(any.len(), 2);
    }
}
