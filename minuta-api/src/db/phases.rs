//! Project phase database operations

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use minuta_common::{Error, Result};

use crate::db::{parse_timestamp, parse_timestamp_opt, parse_uuid};
use crate::models::{PhaseStatus, ProjectPhase};

/// Fields for creating a phase
#[derive(Debug, Clone)]
pub struct NewPhase {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: PhaseStatus,
    pub order: i64,
    pub planned_start_date: Option<chrono::DateTime<Utc>>,
    pub planned_end_date: Option<chrono::DateTime<Utc>>,
}

impl NewPhase {
    /// A pending phase with no schedule, as the materializer creates them
    pub fn pending(project_id: Uuid, name: String, description: Option<String>, order: i64) -> Self {
        Self {
            project_id,
            name,
            description,
            status: PhaseStatus::Pending,
            order,
            planned_start_date: None,
            planned_end_date: None,
        }
    }
}

/// Field edits; None leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct PhaseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order: Option<i64>,
    pub planned_start_date: Option<chrono::DateTime<Utc>>,
    pub planned_end_date: Option<chrono::DateTime<Utc>>,
}

fn map_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProjectPhase> {
    let status: String = row.get("status");

    Ok(ProjectPhase {
        id: parse_uuid(row.get("id"))?,
        project_id: parse_uuid(row.get("project_id"))?,
        name: row.get("name"),
        description: row.get("description"),
        status: PhaseStatus::parse(&status)?,
        order: row.get("phase_order"),
        completion_percentage: row.get("completion_percentage"),
        planned_start_date: parse_timestamp_opt(row.get("planned_start_date"))?,
        planned_end_date: parse_timestamp_opt(row.get("planned_end_date"))?,
        actual_start_date: parse_timestamp_opt(row.get("actual_start_date"))?,
        actual_end_date: parse_timestamp_opt(row.get("actual_end_date"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

/// Insert a new phase with completion 0
pub async fn create(pool: &SqlitePool, new: NewPhase) -> Result<ProjectPhase> {
    let id = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO project_phases (
            id, project_id, name, description, status, phase_order,
            completion_percentage, planned_start_date, planned_end_date,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(new.project_id.to_string())
    .bind(&new.name)
    .bind(new.description.as_deref())
    .bind(new.status.as_str())
    .bind(new.order)
    .bind(new.planned_start_date.map(|dt| dt.to_rfc3339()))
    .bind(new.planned_end_date.map(|dt| dt.to_rfc3339()))
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    get(pool, id)
        .await?
        .ok_or_else(|| Error::Internal("Phase vanished after insert".to_string()))
}

/// Fetch a phase by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<ProjectPhase>> {
    let row = sqlx::query("SELECT * FROM project_phases WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(map_row).transpose()
}

/// List phases ordered by their project sequence
pub async fn list(
    pool: &SqlitePool,
    project_id: Option<Uuid>,
    status: Option<PhaseStatus>,
    skip: i64,
    limit: i64,
) -> Result<Vec<ProjectPhase>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM project_phases
        WHERE (?1 IS NULL OR project_id = ?1)
          AND (?2 IS NULL OR status = ?2)
        ORDER BY phase_order ASC
        LIMIT ?3 OFFSET ?4
        "#,
    )
    .bind(project_id.map(|u| u.to_string()))
    .bind(status.map(|s| s.as_str()))
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_row).collect()
}

/// Count phases matching the filter
pub async fn count(
    pool: &SqlitePool,
    project_id: Option<Uuid>,
    status: Option<PhaseStatus>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM project_phases
        WHERE (?1 IS NULL OR project_id = ?1)
          AND (?2 IS NULL OR status = ?2)
        "#,
    )
    .bind(project_id.map(|u| u.to_string()))
    .bind(status.map(|s| s.as_str()))
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// All phases of one project, in sequence order
pub async fn get_by_project(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<ProjectPhase>> {
    let rows =
        sqlx::query("SELECT * FROM project_phases WHERE project_id = ? ORDER BY phase_order ASC")
            .bind(project_id.to_string())
            .fetch_all(pool)
            .await?;

    rows.iter().map(map_row).collect()
}

/// Apply field edits; returns the fresh row, None if absent
pub async fn update(pool: &SqlitePool, id: Uuid, update: PhaseUpdate) -> Result<Option<ProjectPhase>> {
    let result = sqlx::query(
        r#"
        UPDATE project_phases SET
            name = COALESCE(?2, name),
            description = COALESCE(?3, description),
            phase_order = COALESCE(?4, phase_order),
            planned_start_date = COALESCE(?5, planned_start_date),
            planned_end_date = COALESCE(?6, planned_end_date),
            updated_at = ?7
        WHERE id = ?1
        "#,
    )
    .bind(id.to_string())
    .bind(update.name.as_deref())
    .bind(update.description.as_deref())
    .bind(update.order)
    .bind(update.planned_start_date.map(|dt| dt.to_rfc3339()))
    .bind(update.planned_end_date.map(|dt| dt.to_rfc3339()))
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get(pool, id).await
}

/// Delete a phase; true if a row was removed
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM project_phases WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Update phase status with its side effects
///
/// Completed forces completion to 100 and stamps actual_end_date; the first
/// transition to InProgress stamps actual_start_date.
pub async fn update_status(
    pool: &SqlitePool,
    id: Uuid,
    status: PhaseStatus,
) -> Result<Option<ProjectPhase>> {
    let Some(phase) = get(pool, id).await? else {
        return Ok(None);
    };

    let now = Utc::now();
    let now_str = now.to_rfc3339();

    match status {
        PhaseStatus::Completed => {
            sqlx::query(
                r#"
                UPDATE project_phases
                SET status = 'completed',
                    completion_percentage = 100,
                    actual_end_date = ?2,
                    updated_at = ?2
                WHERE id = ?1
                "#,
            )
            .bind(id.to_string())
            .bind(&now_str)
            .execute(pool)
            .await?;
        }
        PhaseStatus::InProgress => {
            let actual_start = phase
                .actual_start_date
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| now_str.clone());
            sqlx::query(
                r#"
                UPDATE project_phases
                SET status = 'in_progress', actual_start_date = ?2, updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(id.to_string())
            .bind(actual_start)
            .bind(&now_str)
            .execute(pool)
            .await?;
        }
        PhaseStatus::Pending | PhaseStatus::Blocked => {
            sqlx::query("UPDATE project_phases SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id.to_string())
                .bind(status.as_str())
                .bind(&now_str)
                .execute(pool)
                .await?;
        }
    }

    get(pool, id).await
}

/// Update completion percentage; rejects values outside [0, 100]
pub async fn update_completion(
    pool: &SqlitePool,
    id: Uuid,
    completion_percentage: i64,
) -> Result<Option<ProjectPhase>> {
    if !(0..=100).contains(&completion_percentage) {
        return Err(Error::InvalidInput(format!(
            "Completion percentage must be in [0, 100], got {}",
            completion_percentage
        )));
    }

    let result = sqlx::query(
        "UPDATE project_phases SET completion_percentage = ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(id.to_string())
    .bind(completion_percentage)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get(pool, id).await
}

/// Assign new order values to phases of one project
pub async fn reorder(
    pool: &SqlitePool,
    project_id: Uuid,
    phase_orders: &[(Uuid, i64)],
) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    for (phase_id, order) in phase_orders {
        sqlx::query(
            r#"
            UPDATE project_phases
            SET phase_order = ?3, updated_at = ?4
            WHERE id = ?1 AND project_id = ?2
            "#,
        )
        .bind(phase_id.to_string())
        .bind(project_id.to_string())
        .bind(order)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    Ok(())
}
