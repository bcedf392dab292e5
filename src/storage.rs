//! SQLite snapshot cache and settings store.
//!
//! The dashboard writes the last authoritative copy of each collection here
//! after every successful fetch or mutation. On startup, a collection the
//! backend cannot deliver is restored from its snapshot instead.
//!
//! Two tables, both holding JSON payloads:
//!
//! - `collection_snapshots`: one row per collection kind
//! - `settings`: a single row (`id = 1`) with the system settings

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::{CollectionKind, SystemSettings};

/// A collection as it was last saved.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub saved_at: DateTime<Utc>,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
}

impl SnapshotStore {
    /// Open the store and create the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:camwatch.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Every connection to an in-memory database gets its own copy.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.initialize_schema().await?;

        Ok(store)
    }

    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collection_snapshots (
                kind TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                payload TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace the snapshot of one collection.
    pub async fn save_snapshot<T: Serialize>(
        &self,
        kind: CollectionKind,
        items: &[T],
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let payload = serde_json::to_string(items)?;

        sqlx::query(
            r#"
            INSERT INTO collection_snapshots (kind, payload, saved_at)
            VALUES (?, ?, ?)
            ON CONFLICT(kind) DO UPDATE SET payload = excluded.payload, saved_at = excluded.saved_at
            "#,
        )
        .bind(kind.as_str())
        .bind(payload)
        .bind(now.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load the snapshot of one collection, if one was ever saved.
    pub async fn load_snapshot<T: DeserializeOwned>(
        &self,
        kind: CollectionKind,
    ) -> anyhow::Result<Option<Snapshot<T>>> {
        let row = sqlx::query(
            r#"
            SELECT payload, saved_at
            FROM collection_snapshots
            WHERE kind = ?
            "#,
        )
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.get("payload");
        let saved_at: i64 = row.get("saved_at");

        Ok(Some(Snapshot {
            items: serde_json::from_str(&payload)?,
            saved_at: from_millis(saved_at),
        }))
    }

    pub async fn save_settings(
        &self,
        settings: &SystemSettings,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let payload = serde_json::to_string(settings)?;

        sqlx::query(
            r#"
            INSERT INTO settings (id, payload, saved_at)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET payload = excluded.payload, saved_at = excluded.saved_at
            "#,
        )
        .bind(payload)
        .bind(now.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stored settings, or `None` before the first save.
    pub async fn load_settings(&self) -> anyhow::Result<Option<SystemSettings>> {
        let row = sqlx::query("SELECT payload FROM settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let payload: String = row.get("payload");
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => Ok(None),
        }
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Camera, RecordingQuality};
    use crate::seed;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let store = SnapshotStore::new("sqlite::memory:").await.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 6, 11, 12, 0, 0).unwrap();

        store
            .save_snapshot(CollectionKind::Cameras, &seed::cameras(), now)
            .await
            .unwrap();

        let snapshot = store
            .load_snapshot::<Camera>(CollectionKind::Cameras)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.items, seed::cameras());
        assert_eq!(snapshot.saved_at, now);
    }

    #[tokio::test]
    async fn test_missing_snapshot() {
        let store = SnapshotStore::new("sqlite::memory:").await.unwrap();

        let snapshot = store
            .load_snapshot::<Camera>(CollectionKind::Recordings)
            .await
            .unwrap();
        assert!(snapshot.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_overwrite() {
        let store = SnapshotStore::new("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        store
            .save_snapshot(CollectionKind::Cameras, &seed::cameras(), now)
            .await
            .unwrap();
        let mut fewer = seed::cameras();
        fewer.truncate(1);
        store
            .save_snapshot(CollectionKind::Cameras, &fewer, now)
            .await
            .unwrap();

        let snapshot = store
            .load_snapshot::<Camera>(CollectionKind::Cameras)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.items.len(), 1);
    }

    #[tokio::test]
    async fn test_settings_round_trip() {
        let store = SnapshotStore::new("sqlite::memory:").await.unwrap();
        assert!(store.load_settings().await.unwrap().is_none());

        let settings = SystemSettings {
            recording_quality: RecordingQuality::Ultra,
            storage_retention_days: 90,
            ..SystemSettings::default()
        };
        store.save_settings(&settings, Utc::now()).await.unwrap();

        assert_eq!(store.load_settings().await.unwrap(), Some(settings));
    }
}
