//! Database schema migrations.
//!
//! All statements are `IF NOT EXISTS`, so running them repeatedly is safe.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Connect to the configured database and create any missing tables.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create any missing tables on an existing pool.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // One row per talk; `position` preserves bucket order.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS talks (
            speaker TEXT NOT NULL,
            position INTEGER NOT NULL,
            title TEXT NOT NULL,
            session TEXT NOT NULL,
            scheduled_time TEXT NOT NULL,
            uri TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL,
            preview TEXT NOT NULL DEFAULT '',
            audio_url TEXT NOT NULL,
            audio_size INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (speaker, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metadata (
            singleton INTEGER PRIMARY KEY CHECK (singleton = 1),
            version TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS id_mappings (
            id TEXT PRIMARY KEY,
            speakers_key TEXT NOT NULL UNIQUE,
            speakers_json TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
