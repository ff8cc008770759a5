//! Requirement database operations

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use minuta_common::{Error, Result};

use crate::db::{parse_timestamp, parse_uuid, parse_uuid_opt};
use crate::models::{Requirement, RequirementPriority, RequirementStatus, RequirementType};

/// Fields for creating a requirement
#[derive(Debug, Clone)]
pub struct NewRequirement {
    pub project_id: Uuid,
    pub phase_id: Uuid,
    pub transcription_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub requirement_type: RequirementType,
    pub priority: RequirementPriority,
    pub extracted_by_ai: bool,
}

/// Field edits; None leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct RequirementUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirement_type: Option<RequirementType>,
    pub priority: Option<RequirementPriority>,
}

impl RequirementUpdate {
    /// Whether this edit touches a field that marks human authorship
    fn edits_content(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.requirement_type.is_some()
            || self.priority.is_some()
    }
}

/// Optional list filters
#[derive(Debug, Clone, Default)]
pub struct RequirementFilter {
    pub project_id: Option<Uuid>,
    pub phase_id: Option<Uuid>,
    pub status: Option<RequirementStatus>,
    pub priority: Option<RequirementPriority>,
    pub requirement_type: Option<RequirementType>,
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<Requirement> {
    let requirement_type: String = row.get("type");
    let priority: String = row.get("priority");
    let status: String = row.get("status");

    Ok(Requirement {
        id: parse_uuid(row.get("id"))?,
        project_id: parse_uuid(row.get("project_id"))?,
        phase_id: parse_uuid(row.get("phase_id"))?,
        transcription_id: parse_uuid_opt(row.get("transcription_id"))?,
        title: row.get("title"),
        description: row.get("description"),
        requirement_type: RequirementType::parse(&requirement_type)?,
        priority: RequirementPriority::parse(&priority)?,
        status: RequirementStatus::parse(&status)?,
        extracted_by_ai: row.get::<i64, _>("extracted_by_ai") != 0,
        user_edited: row.get::<i64, _>("user_edited") != 0,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

/// Insert a new requirement in `pending` state with `user_edited = false`
pub async fn create(pool: &SqlitePool, new: NewRequirement) -> Result<Requirement> {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO requirements (
            id, project_id, phase_id, transcription_id, title, description,
            type, priority, status, extracted_by_ai, user_edited,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, 0, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(new.project_id.to_string())
    .bind(new.phase_id.to_string())
    .bind(new.transcription_id.map(|u| u.to_string()))
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.requirement_type.as_str())
    .bind(new.priority.as_str())
    .bind(new.extracted_by_ai as i64)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("Requirement vanished after insert".to_string()))
}

/// Fetch a requirement by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Requirement>> {
    let row = sqlx::query("SELECT * FROM requirements WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_row).transpose()
}

/// List requirements, newest first
pub async fn list(
    pool: &SqlitePool,
    filter: &RequirementFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<Requirement>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM requirements
        WHERE (?1 IS NULL OR project_id = ?1)
          AND (?2 IS NULL OR phase_id = ?2)
          AND (?3 IS NULL OR status = ?3)
          AND (?4 IS NULL OR priority = ?4)
          AND (?5 IS NULL OR type = ?5)
        ORDER BY created_at DESC
        LIMIT ?6 OFFSET ?7
        "#,
    )
    .bind(filter.project_id.map(|u| u.to_string()))
    .bind(filter.phase_id.map(|u| u.to_string()))
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.priority.map(|p| p.as_str()))
    .bind(filter.requirement_type.map(|t| t.as_str()))
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_row).collect()
}

/// Count requirements matching the filter
pub async fn count(pool: &SqlitePool, filter: &RequirementFilter) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM requirements
        WHERE (?1 IS NULL OR project_id = ?1)
          AND (?2 IS NULL OR phase_id = ?2)
          AND (?3 IS NULL OR status = ?3)
          AND (?4 IS NULL OR priority = ?4)
          AND (?5 IS NULL OR type = ?5)
        "#,
    )
    .bind(filter.project_id.map(|u| u.to_string()))
    .bind(filter.phase_id.map(|u| u.to_string()))
    .bind(filter.status.map(|s| s.as_str()))
    .bind(filter.priority.map(|p| p.as_str()))
    .bind(filter.requirement_type.map(|t| t.as_str()))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// All requirements of one phase, oldest first
pub async fn get_by_phase(pool: &SqlitePool, phase_id: Uuid) -> Result<Vec<Requirement>> {
    let rows = sqlx::query("SELECT * FROM requirements WHERE phase_id = ? ORDER BY created_at ASC")
        .bind(phase_id.to_string())
        .fetch_all(pool)
        .await?;

    rows.iter().map(map_row).collect()
}

/// Apply field edits; an edit to title/description/priority/type marks the
/// requirement as user-edited. Returns the fresh row, None if absent.
pub async fn update(
    pool: &SqlitePool,
    id: Uuid,
    update: RequirementUpdate,
) -> Result<Option<Requirement>> {
    if !update.edits_content() {
        return get(pool, id).await;
    }

    let result = sqlx::query(
        r#"
        UPDATE requirements SET
            title = COALESCE(?2, title),
            description = COALESCE(?3, description),
            type = COALESCE(?4, type),
            priority = COALESCE(?5, priority),
            user_edited = 1,
            updated_at = ?6
        WHERE id = ?1
        "#,
    )
    .bind(id.to_string())
    .bind(update.title.as_deref())
    .bind(update.description.as_deref())
    .bind(update.requirement_type.map(|t| t.as_str()))
    .bind(update.priority.map(|p| p.as_str()))
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get(pool, id).await
}

/// Delete a requirement; true if a row was removed
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM requirements WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Update requirement status only
pub async fn update_status(
    pool: &SqlitePool,
    id: Uuid,
    status: RequirementStatus,
) -> Result<Option<Requirement>> {
    let result =
        sqlx::query("UPDATE requirements SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.to_string())
            .bind(status.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get(pool, id).await
}

/// Reassign a requirement to another phase
pub async fn move_to_phase(
    pool: &SqlitePool,
    id: Uuid,
    new_phase_id: Uuid,
) -> Result<Option<Requirement>> {
    let result =
        sqlx::query("UPDATE requirements SET phase_id = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id.to_string())
            .bind(new_phase_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get(pool, id).await
}
