//! Database access for minuta-api
//!
//! SQLite via sqlx. Tables are created at startup with
//! `CREATE TABLE IF NOT EXISTS`; every row carries TEXT UUIDs and RFC3339
//! TEXT timestamps.

pub mod phases;
pub mod requirements;
pub mod transcripts;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the minuta tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transcripts (
            id TEXT PRIMARY KEY,
            transcription_text TEXT NOT NULL,
            user_email TEXT NOT NULL,
            meeting_id TEXT,
            project_id TEXT,
            language TEXT NOT NULL DEFAULT 'es',
            source TEXT NOT NULL DEFAULT 'teams',
            status TEXT NOT NULL DEFAULT 'pending',
            error_message TEXT,
            ai_analysis TEXT,
            ai_model_used TEXT,
            processed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project_phases (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            phase_order INTEGER NOT NULL DEFAULT 1,
            completion_percentage INTEGER NOT NULL DEFAULT 0,
            planned_start_date TEXT,
            planned_end_date TEXT,
            actual_start_date TEXT,
            actual_end_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS requirements (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            phase_id TEXT NOT NULL,
            transcription_id TEXT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            type TEXT NOT NULL DEFAULT 'functional',
            priority TEXT NOT NULL DEFAULT 'medium',
            status TEXT NOT NULL DEFAULT 'pending',
            extracted_by_ai INTEGER NOT NULL DEFAULT 0,
            user_edited INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (transcripts, project_phases, requirements)");

    Ok(())
}

/// Parse a stored RFC3339 timestamp
pub(crate) fn parse_timestamp(s: &str) -> minuta_common::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| minuta_common::Error::Internal(format!("Failed to parse timestamp: {}", e)))
}

/// Parse an optional stored RFC3339 timestamp
pub(crate) fn parse_timestamp_opt(
    s: Option<String>,
) -> minuta_common::Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_timestamp).transpose()
}

/// Parse a stored UUID column
pub(crate) fn parse_uuid(s: &str) -> minuta_common::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(s)
        .map_err(|e| minuta_common::Error::Internal(format!("Failed to parse UUID: {}", e)))
}

/// Parse an optional stored UUID column
pub(crate) fn parse_uuid_opt(s: Option<String>) -> minuta_common::Result<Option<uuid::Uuid>> {
    s.as_deref().map(parse_uuid).transpose()
}
