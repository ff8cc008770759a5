//! Project phase API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use minuta_common::api::{Message, PaginatedResponse};

use crate::db::phases::{self, NewPhase, PhaseUpdate};
use crate::models::{PhaseStatus, ProjectPhase};
use crate::{ApiError, ApiResult, AppState};

/// Request payload for creating a phase
#[derive(Debug, Deserialize)]
pub struct CreatePhaseRequest {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: PhaseStatus,
    #[serde(default = "default_order")]
    pub order: i64,
    pub planned_start_date: Option<DateTime<Utc>>,
    pub planned_end_date: Option<DateTime<Utc>>,
}

fn default_status() -> PhaseStatus {
    PhaseStatus::Pending
}

fn default_order() -> i64 {
    1
}

/// Request payload for field edits
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePhaseRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub order: Option<i64>,
    pub planned_start_date: Option<DateTime<Utc>>,
    pub planned_end_date: Option<DateTime<Utc>>,
}

/// Request payload for a status change
#[derive(Debug, Deserialize)]
pub struct PhaseStatusRequest {
    pub status: PhaseStatus,
}

/// Request payload for a completion update
#[derive(Debug, Deserialize)]
pub struct PhaseCompletionRequest {
    pub completion_percentage: i64,
}

/// One entry of a reorder request
#[derive(Debug, Deserialize)]
pub struct PhaseOrderEntry {
    pub phase_id: Uuid,
    pub order: i64,
}

/// Request payload for reordering a project's phases
#[derive(Debug, Deserialize)]
pub struct ReorderPhasesRequest {
    pub project_id: Uuid,
    pub phase_orders: Vec<PhaseOrderEntry>,
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub project_id: Option<Uuid>,
    pub status: Option<String>,
}

fn default_limit() -> i64 {
    100
}

/// POST /api/phases
pub async fn create_phase(
    State(state): State<AppState>,
    Json(payload): Json<CreatePhaseRequest>,
) -> ApiResult<(StatusCode, Json<ProjectPhase>)> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Phase name cannot be empty".to_string()));
    }

    let phase = phases::create(
        &state.db,
        NewPhase {
            project_id: payload.project_id,
            name: payload.name,
            description: payload.description,
            status: payload.status,
            order: payload.order,
            planned_start_date: payload.planned_start_date,
            planned_end_date: payload.planned_end_date,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(phase)))
}

/// GET /api/phases
pub async fn list_phases(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PaginatedResponse<ProjectPhase>>> {
    let status = query
        .status
        .as_deref()
        .map(PhaseStatus::parse)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Unknown status filter".to_string()))?;

    let skip = query.skip.max(0);
    let limit = query.limit.clamp(1, 100);

    let items = phases::list(&state.db, query.project_id, status, skip, limit).await?;
    let total = phases::count(&state.db, query.project_id, status).await?;

    Ok(Json(PaginatedResponse::new(items, total, skip, limit)))
}

/// GET /api/phases/:id
pub async fn get_phase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectPhase>> {
    let phase = phases::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Phase {}", id)))?;

    Ok(Json(phase))
}

/// PUT /api/phases/:id
pub async fn update_phase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePhaseRequest>,
) -> ApiResult<Json<ProjectPhase>> {
    let updated = phases::update(
        &state.db,
        id,
        PhaseUpdate {
            name: payload.name,
            description: payload.description,
            order: payload.order,
            planned_start_date: payload.planned_start_date,
            planned_end_date: payload.planned_end_date,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Phase {}", id)))?;

    Ok(Json(updated))
}

/// DELETE /api/phases/:id
pub async fn delete_phase(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Message>> {
    if !phases::delete(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Phase {}", id)));
    }

    Ok(Json(Message::new("Phase deleted")))
}

/// PUT /api/phases/:id/status
///
/// Completed forces completion to 100; the first transition to in_progress
/// stamps the actual start date.
pub async fn update_phase_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PhaseStatusRequest>,
) -> ApiResult<Json<ProjectPhase>> {
    let updated = phases::update_status(&state.db, id, payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Phase {}", id)))?;

    Ok(Json(updated))
}

/// PUT /api/phases/:id/completion
pub async fn update_phase_completion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PhaseCompletionRequest>,
) -> ApiResult<Json<ProjectPhase>> {
    let updated = phases::update_completion(&state.db, id, payload.completion_percentage)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Phase {}", id)))?;

    Ok(Json(updated))
}

/// PUT /api/phases/reorder
pub async fn reorder_phases(
    State(state): State<AppState>,
    Json(payload): Json<ReorderPhasesRequest>,
) -> ApiResult<Json<Message>> {
    let orders: Vec<(Uuid, i64)> = payload
        .phase_orders
        .iter()
        .map(|entry| (entry.phase_id, entry.order))
        .collect();

    phases::reorder(&state.db, payload.project_id, &orders).await?;

    Ok(Json(Message::new("Phases reordered")))
}

/// Build phase routes
pub fn phase_routes() -> Router<AppState> {
    Router::new()
        .route("/api/phases", post(create_phase).get(list_phases))
        .route("/api/phases/reorder", put(reorder_phases))
        .route(
            "/api/phases/:id",
            get(get_phase).put(update_phase).delete(delete_phase),
        )
        .route("/api/phases/:id/status", put(update_phase_status))
        .route("/api/phases/:id/completion", put(update_phase_completion))
}
