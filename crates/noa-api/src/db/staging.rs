//! Staging queue: every generated configuration awaiting review.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use noa_protocol::request::ConfigRequest;
use noa_protocol::staging::{StagingRecord, StagingStatus};
use noa_retrieval::normalize;

/// Staging row returned from the database.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StagingRow {
    pub id: i64,
    pub vendor: String,
    pub model: String,
    pub os_version: String,
    pub feature: String,
    pub parameters: String,
    pub generated_config: String,
    pub status: String,
    pub device_ip: String,
    pub device_name: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<StagingRow> for StagingRecord {
    type Error = sqlx::Error;

    fn try_from(row: StagingRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<StagingStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Self {
            id: row.id,
            vendor: row.vendor,
            model: row.model,
            os_version: row.os_version,
            feature: row.feature,
            parameters: row.parameters,
            generated_config: row.generated_config,
            status,
            device_ip: row.device_ip,
            device_name: row.device_name,
            created_at: row.created_at,
        })
    }
}

fn into_records(rows: Vec<StagingRow>) -> Result<Vec<StagingRecord>, sqlx::Error> {
    rows.into_iter().map(StagingRecord::try_from).collect()
}

/// Insert a new record (status = 'pending') and return its id.
///
/// The key fields are also stored normalized for [`find_matching`].
pub async fn enqueue(
    pool: &SqlitePool,
    request: &ConfigRequest,
    generated_config: &str,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO staging_queue (vendor, model, os_version, feature, parameters,
             generated_config, status, device_ip, device_name, created_at,
             vendor_key, model_key, os_version_key, feature_key)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&request.vendor)
    .bind(&request.model)
    .bind(&request.os_version)
    .bind(&request.feature)
    .bind(&request.parameters)
    .bind(generated_config)
    .bind(StagingStatus::Pending.as_str())
    .bind(&request.device_ip)
    .bind(&request.device_name)
    .bind(Utc::now())
    .bind(normalize(&request.vendor))
    .bind(normalize(&request.model))
    .bind(normalize(&request.os_version))
    .bind(normalize(&request.feature))
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Get a record by id.
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<StagingRecord>, sqlx::Error> {
    sqlx::query_as::<_, StagingRow>("SELECT * FROM staging_queue WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(StagingRecord::try_from)
        .transpose()
}

/// List records, newest first, optionally filtered by status.
pub async fn list(
    pool: &SqlitePool,
    status: Option<StagingStatus>,
) -> Result<Vec<StagingRecord>, sqlx::Error> {
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, StagingRow>(
                "SELECT * FROM staging_queue WHERE status = ? ORDER BY created_at DESC, id DESC",
            )
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, StagingRow>(
                "SELECT * FROM staging_queue ORDER BY created_at DESC, id DESC",
            )
            .fetch_all(pool)
            .await?
        }
    };
    into_records(rows)
}

/// Set the status of a record. Returns `false` when no record has that id.
///
/// This is a single-row, last-writer-wins update; callers decide which
/// transitions are allowed.
pub async fn transition(
    pool: &SqlitePool,
    id: i64,
    status: StagingStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE staging_queue SET status = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Records whose key fields match case-insensitively, newest first.
pub async fn find_matching(
    pool: &SqlitePool,
    vendor: &str,
    model: &str,
    os_version: &str,
    feature: &str,
) -> Result<Vec<StagingRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StagingRow>(
        "SELECT * FROM staging_queue
         WHERE vendor_key = ? AND model_key = ? AND os_version_key = ? AND feature_key = ?
         ORDER BY created_at DESC, id DESC",
    )
    .bind(normalize(vendor))
    .bind(normalize(model))
    .bind(normalize(os_version))
    .bind(normalize(feature))
    .fetch_all(pool)
    .await?;
    into_records(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::memory_pool;

    pub(crate) fn vlan_request() -> ConfigRequest {
        ConfigRequest {
            vendor: "Cisco".into(),
            model: "Catalyst 9200".into(),
            os_version: "IOS XE".into(),
            feature: "VLAN".into(),
            parameters: "Create VLAN 30 named IoT, 192.168.30.1/24".into(),
            device_ip: "10.0.0.5".into(),
            device_name: "access-sw-01".into(),
        }
    }

    #[tokio::test]
    async fn enqueue_starts_pending() {
        let pool = memory_pool().await;
        let id = enqueue(&pool, &vlan_request(), "vlan 30\n name IoT").await.unwrap();

        let record = get(&pool, id).await.unwrap().unwrap();
        assert_eq!(record.status, StagingStatus::Pending);
        assert_eq!(record.generated_config, "vlan 30\n name IoT");
        assert_eq!(record.device_name, "access-sw-01");
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let pool = memory_pool().await;
        assert!(get(&pool, 999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_newest_first_and_filtered() {
        let pool = memory_pool().await;
        let first = enqueue(&pool, &vlan_request(), "a").await.unwrap();
        let second = enqueue(&pool, &vlan_request(), "b").await.unwrap();
        let third = enqueue(&pool, &vlan_request(), "c").await.unwrap();
        transition(&pool, second, StagingStatus::Rejected).await.unwrap();

        let all = list(&pool, None).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![third, second, first]);

        let pending = list(&pool, Some(StagingStatus::Pending)).await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![third, first]);
    }

    #[tokio::test]
    async fn transition_keeps_generated_config() {
        let pool = memory_pool().await;
        let id = enqueue(&pool, &vlan_request(), "vlan 30").await.unwrap();

        for status in [StagingStatus::Error, StagingStatus::Pushed, StagingStatus::Rejected] {
            assert!(transition(&pool, id, status).await.unwrap());
            let record = get(&pool, id).await.unwrap().unwrap();
            assert_eq!(record.status, status);
            assert_eq!(record.generated_config, "vlan 30");
        }
    }

    #[tokio::test]
    async fn transition_missing_record() {
        let pool = memory_pool().await;
        assert!(!transition(&pool, 41, StagingStatus::Pushed).await.unwrap());
    }

    #[tokio::test]
    async fn find_matching_ignores_case() {
        let pool = memory_pool().await;
        enqueue(&pool, &vlan_request(), "vlan 30").await.unwrap();
        let found = find_matching(&pool, "cisco", "CATALYST 9200", "ios xe", "vlan")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let none = find_matching(&pool, "cisco", "nexus 9000", "ios xe", "vlan")
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn find_matching_folds_non_ascii_case() {
        let pool = memory_pool().await;
        let request = ConfigRequest {
            vendor: "Öster".into(),
            model: "Ünit 1".into(),
            ..vlan_request()
        };
        let id = enqueue(&pool, &request, "vlan 40").await.unwrap();
        enqueue(&pool, &vlan_request(), "vlan 30").await.unwrap();

        let found = find_matching(&pool, "ÖSTER", "ünit 1", "IOS XE", "VLAN")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert_eq!(found[0].vendor, "Öster");
    }
}
