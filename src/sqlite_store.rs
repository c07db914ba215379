//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the schema created by
//! [`migrate`](crate::migrate): `talks`, `metadata`, and `id_mappings`.
//!
//! - Bucket replacement runs in a single transaction, so WAL readers see
//!   the old data set until commit and nothing at all changes on error.
//! - Id insertion relies on the `id` primary key and the `speakers_key`
//!   unique constraint: `INSERT .. ON CONFLICT DO NOTHING` either wins or
//!   tells us, by a follow-up read, which constraint it lost on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use speakercast_core::models::{
    DatabaseMetadata, IdMapping, SpeakerBuckets, SpeakerCount, StoreStats, TalkRecord,
};
use speakercast_core::store::{InsertOutcome, Store};

use crate::config::Config;
use crate::{db, migrate};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
    refresh: Mutex<()>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            refresh: Mutex::new(()),
        }
    }

    /// Connect to the configured database and ensure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::migrate_pool(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn talk_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TalkRecord> {
    let session: String = row.get("session");
    let scheduled: String = row.get("scheduled_time");
    Ok(TalkRecord {
        title: row.get("title"),
        speaker: row.get("speaker"),
        session: session.parse()?,
        scheduled_time: DateTime::parse_from_rfc3339(&scheduled)
            .with_context(|| format!("bad scheduled_time in talks table: {}", scheduled))?,
        uri: row.get("uri"),
        url: row.get("url"),
        preview: row.get("preview"),
        audio_url: row.get("audio_url"),
        audio_size: row.get("audio_size"),
    })
}

#[async_trait]
impl Store for SqliteStore {
    fn refresh_lock(&self) -> &Mutex<()> {
        &self.refresh
    }

    async fn replace_speaker_buckets(&self, buckets: &SpeakerBuckets) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM talks").execute(&mut *tx).await?;

        for (speaker, talks) in buckets {
            for (position, talk) in talks.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO talks (speaker, position, title, session, scheduled_time,
                                       uri, url, preview, audio_url, audio_size)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(speaker)
                .bind(position as i64)
                .bind(&talk.title)
                .bind(talk.session.label())
                .bind(talk.scheduled_time.to_rfc3339())
                .bind(&talk.uri)
                .bind(&talk.url)
                .bind(&talk.preview)
                .bind(&talk.audio_url)
                .bind(talk.audio_size)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn speaker_counts(&self) -> Result<Vec<SpeakerCount>> {
        let rows = sqlx::query("SELECT speaker, COUNT(*) AS count FROM talks GROUP BY speaker")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| SpeakerCount {
                count: row.get("count"),
                speaker: row.get("speaker"),
            })
            .collect())
    }

    async fn talks_for(&self, speaker: &str) -> Result<Vec<TalkRecord>> {
        let rows = sqlx::query("SELECT * FROM talks WHERE speaker = ? ORDER BY position")
            .bind(speaker)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(talk_from_row).collect()
    }

    async fn metadata(&self) -> Result<Option<DatabaseMetadata>> {
        let row = sqlx::query("SELECT version, updated_at FROM metadata WHERE singleton = 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|row| DatabaseMetadata {
            version: row.get("version"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn put_metadata(&self, metadata: &DatabaseMetadata) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO metadata (singleton, version, updated_at) VALUES (1, ?, ?)
            ON CONFLICT(singleton) DO UPDATE SET
                version = excluded.version,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&metadata.version)
        .bind(metadata.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_id(&self, speakers_key: &str) -> Result<Option<String>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM id_mappings WHERE speakers_key = ?")
                .bind(speakers_key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(id)
    }

    async fn id_mapping(&self, id: &str) -> Result<Option<IdMapping>> {
        let json: Option<String> =
            sqlx::query_scalar("SELECT speakers_json FROM id_mappings WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        match json {
            Some(json) => Ok(Some(IdMapping {
                id: id.to_string(),
                speakers: serde_json::from_str(&json)
                    .with_context(|| format!("bad speakers_json for id {}", id))?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_id_mapping(&self, mapping: &IdMapping) -> Result<InsertOutcome> {
        let key = mapping.speakers_key();
        let result = sqlx::query(
            r#"
            INSERT INTO id_mappings (id, speakers_key, speakers_json, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&mapping.id)
        .bind(&key)
        .bind(serde_json::to_string(&mapping.speakers)?)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(InsertOutcome::Inserted);
        }
        match self.find_id(&key).await? {
            Some(existing) => Ok(InsertOutcome::SpeakersExist(existing)),
            None => Ok(InsertOutcome::IdTaken),
        }
    }

    async fn clear_id_mappings(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM id_mappings")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let speakers: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT speaker) FROM talks")
            .fetch_one(&self.pool)
            .await?;
        let talks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM talks")
            .fetch_one(&self.pool)
            .await?;
        let id_mappings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM id_mappings")
            .fetch_one(&self.pool)
            .await?;
        let version = self.metadata().await?.map(|m| m.version);
        Ok(StoreStats {
            speakers,
            talks,
            id_mappings,
            version,
        })
    }
}
