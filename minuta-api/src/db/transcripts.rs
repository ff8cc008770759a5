//! Transcript database operations
//!
//! Status transitions are issued only by the pipeline orchestrator. The
//! claim to `processing` is a single conditional UPDATE so two concurrent
//! process calls cannot both win.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use minuta_common::{Error, Result};

use crate::db::{parse_timestamp, parse_timestamp_opt, parse_uuid, parse_uuid_opt};
use crate::models::{AnalysisResult, Transcript, TranscriptStatus};

/// Fields for creating a transcript
#[derive(Debug, Clone)]
pub struct NewTranscript {
    pub transcription_text: String,
    pub user_email: String,
    pub meeting_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub language: String,
    pub source: String,
}

/// Direct field edits prior to processing; None leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct TranscriptUpdate {
    pub transcription_text: Option<String>,
    pub meeting_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub language: Option<String>,
    pub source: Option<String>,
}

/// Optional list filters
#[derive(Debug, Clone, Default)]
pub struct TranscriptFilter {
    pub user_email: Option<String>,
    pub project_id: Option<Uuid>,
    pub status: Option<TranscriptStatus>,
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<Transcript> {
    let status: String = row.get("status");
    let ai_analysis: Option<String> = row.get("ai_analysis");
    let ai_analysis: Option<AnalysisResult> = ai_analysis
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to deserialize analysis: {}", e)))?;

    Ok(Transcript {
        id: parse_uuid(row.get("id"))?,
        transcription_text: row.get("transcription_text"),
        user_email: row.get("user_email"),
        meeting_id: parse_uuid_opt(row.get("meeting_id"))?,
        project_id: parse_uuid_opt(row.get("project_id"))?,
        language: row.get("language"),
        source: row.get("source"),
        status: TranscriptStatus::parse(&status)?,
        error_message: row.get("error_message"),
        ai_analysis,
        ai_model_used: row.get("ai_model_used"),
        processed_at: parse_timestamp_opt(row.get("processed_at"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

/// Insert a new transcript in `pending` state
pub async fn create(pool: &SqlitePool, new: NewTranscript) -> Result<Transcript> {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO transcripts (
            id, transcription_text, user_email, meeting_id, project_id,
            language, source, status, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&new.transcription_text)
    .bind(&new.user_email)
    .bind(new.meeting_id.map(|u| u.to_string()))
    .bind(new.project_id.map(|u| u.to_string()))
    .bind(&new.language)
    .bind(&new.source)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("Transcript vanished after insert".to_string()))
}

/// Fetch a transcript by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Transcript>> {
    let row = sqlx::query("SELECT * FROM transcripts WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_row).transpose()
}

/// List transcripts, newest first
pub async fn list(
    pool: &SqlitePool,
    filter: &TranscriptFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<Transcript>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM transcripts
        WHERE (?1 IS NULL OR user_email = ?1)
          AND (?2 IS NULL OR project_id = ?2)
          AND (?3 IS NULL OR status = ?3)
        ORDER BY created_at DESC
        LIMIT ?4 OFFSET ?5
        "#,
    )
    .bind(filter.user_email.as_deref())
    .bind(filter.project_id.map(|u| u.to_string()))
    .bind(filter.status.map(|s| s.as_str()))
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_row).collect()
}

/// Count transcripts matching the filter
pub async fn count(pool: &SqlitePool, filter: &TranscriptFilter) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM transcripts
        WHERE (?1 IS NULL OR user_email = ?1)
          AND (?2 IS NULL OR project_id = ?2)
          AND (?3 IS NULL OR status = ?3)
        "#,
    )
    .bind(filter.user_email.as_deref())
    .bind(filter.project_id.map(|u| u.to_string()))
    .bind(filter.status.map(|s| s.as_str()))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Apply direct field edits; returns the fresh row, None if absent
pub async fn update(
    pool: &SqlitePool,
    id: Uuid,
    update: TranscriptUpdate,
) -> Result<Option<Transcript>> {
    let result = sqlx::query(
        r#"
        UPDATE transcripts SET
            transcription_text = COALESCE(?2, transcription_text),
            meeting_id = COALESCE(?3, meeting_id),
            project_id = COALESCE(?4, project_id),
            language = COALESCE(?5, language),
            source = COALESCE(?6, source),
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(id.to_string())
    .bind(update.transcription_text.as_deref())
    .bind(update.meeting_id.map(|u| u.to_string()))
    .bind(update.project_id.map(|u| u.to_string()))
    .bind(update.language.as_deref())
    .bind(update.source.as_deref())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get(pool, id).await
}

/// Delete a transcript; true if a row was removed
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM transcripts WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Conditionally claim a transcript for processing
///
/// Transitions pending/completed/error → processing in one atomic UPDATE.
/// Returns false when the row is already `processing` (a concurrent claim
/// holds it) so the caller can reject with a conflict.
pub async fn claim_processing(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE transcripts
        SET status = 'processing', updated_at = ?2
        WHERE id = ?1 AND status != 'processing'
        "#,
    )
    .bind(id.to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Persist a successful analysis: result + completed status + model id
pub async fn mark_completed(
    pool: &SqlitePool,
    id: Uuid,
    analysis: &AnalysisResult,
    model: &str,
    processed_at: DateTime<Utc>,
) -> Result<()> {
    let analysis_json = serde_json::to_string(analysis)
        .map_err(|e| Error::Internal(format!("Failed to serialize analysis: {}", e)))?;

    sqlx::query(
        r#"
        UPDATE transcripts
        SET status = 'completed',
            ai_analysis = ?2,
            ai_model_used = ?3,
            processed_at = ?4,
            error_message = NULL,
            updated_at = ?5
        WHERE id = ?1
        "#,
    )
    .bind(id.to_string())
    .bind(analysis_json)
    .bind(model)
    .bind(processed_at.to_rfc3339())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a processing failure
///
/// Leaves any previously stored analysis untouched; the error message and
/// status are what distinguish the failed attempt.
pub async fn mark_error(pool: &SqlitePool, id: Uuid, message: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE transcripts
        SET status = 'error', error_message = ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id.to_string())
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
