//! Requirement API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use minuta_common::api::{Message, PaginatedResponse};

use crate::db::requirements::{self, NewRequirement, RequirementFilter, RequirementUpdate};
use crate::models::{Requirement, RequirementPriority, RequirementStatus, RequirementType};
use crate::{ApiError, ApiResult, AppState};

/// Request payload for creating a requirement manually
#[derive(Debug, Deserialize)]
pub struct CreateRequirementRequest {
    pub project_id: Uuid,
    pub phase_id: Uuid,
    pub transcription_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_type")]
    pub requirement_type: RequirementType,
    #[serde(default = "default_priority")]
    pub priority: RequirementPriority,
}

fn default_type() -> RequirementType {
    RequirementType::Functional
}

fn default_priority() -> RequirementPriority {
    RequirementPriority::Medium
}

/// Request payload for field edits; any content edit flips `user_edited`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequirementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub requirement_type: Option<RequirementType>,
    pub priority: Option<RequirementPriority>,
}

/// Request payload for a status change
#[derive(Debug, Deserialize)]
pub struct RequirementStatusRequest {
    pub status: RequirementStatus,
}

/// Request payload for moving a requirement to another phase
#[derive(Debug, Deserialize)]
pub struct MoveRequirementRequest {
    pub phase_id: Uuid,
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub project_id: Option<Uuid>,
    pub phase_id: Option<Uuid>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub requirement_type: Option<String>,
}

fn default_limit() -> i64 {
    100
}

/// POST /api/requirements
pub async fn create_requirement(
    State(state): State<AppState>,
    Json(payload): Json<CreateRequirementRequest>,
) -> ApiResult<(StatusCode, Json<Requirement>)> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Requirement title cannot be empty".to_string(),
        ));
    }

    let requirement = requirements::create(
        &state.db,
        NewRequirement {
            project_id: payload.project_id,
            phase_id: payload.phase_id,
            transcription_id: payload.transcription_id,
            title: payload.title,
            description: payload.description,
            requirement_type: payload.requirement_type,
            priority: payload.priority,
            extracted_by_ai: false,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(requirement)))
}

/// GET /api/requirements
pub async fn list_requirements(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PaginatedResponse<Requirement>>> {
    let status = query
        .status
        .as_deref()
        .map(RequirementStatus::parse)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Unknown status filter".to_string()))?;
    let priority = query
        .priority
        .as_deref()
        .map(RequirementPriority::parse)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Unknown priority filter".to_string()))?;
    let requirement_type = query
        .requirement_type
        .as_deref()
        .map(RequirementType::parse)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Unknown type filter".to_string()))?;

    let filter = RequirementFilter {
        project_id: query.project_id,
        phase_id: query.phase_id,
        status,
        priority,
        requirement_type,
    };

    let skip = query.skip.max(0);
    let limit = query.limit.clamp(1, 100);

    let items = requirements::list(&state.db, &filter, skip, limit).await?;
    let total = requirements::count(&state.db, &filter).await?;

    Ok(Json(PaginatedResponse::new(items, total, skip, limit)))
}

/// GET /api/requirements/:id
pub async fn get_requirement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Requirement>> {
    let requirement = requirements::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Requirement {}", id)))?;

    Ok(Json(requirement))
}

/// PUT /api/requirements/:id
pub async fn update_requirement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequirementRequest>,
) -> ApiResult<Json<Requirement>> {
    let updated = requirements::update(
        &state.db,
        id,
        RequirementUpdate {
            title: payload.title,
            description: payload.description,
            requirement_type: payload.requirement_type,
            priority: payload.priority,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Requirement {}", id)))?;

    Ok(Json(updated))
}

/// DELETE /api/requirements/:id
pub async fn delete_requirement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Message>> {
    if !requirements::delete(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Requirement {}", id)));
    }

    Ok(Json(Message::new("Requirement deleted")))
}

/// PUT /api/requirements/:id/status
pub async fn update_requirement_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RequirementStatusRequest>,
) -> ApiResult<Json<Requirement>> {
    let updated = requirements::update_status(&state.db, id, payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Requirement {}", id)))?;

    Ok(Json(updated))
}

/// PUT /api/requirements/:id/move
pub async fn move_requirement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveRequirementRequest>,
) -> ApiResult<Json<Requirement>> {
    let updated = requirements::move_to_phase(&state.db, id, payload.phase_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Requirement {}", id)))?;

    Ok(Json(updated))
}

/// Build requirement routes
pub fn requirement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/requirements",
            post(create_requirement).get(list_requirements),
        )
        .route(
            "/api/requirements/:id",
            get(get_requirement)
                .put(update_requirement)
                .delete(delete_requirement),
        )
        .route(
            "/api/requirements/:id/status",
            put(update_requirement_status),
        )
        .route("/api/requirements/:id/move", put(move_requirement))
}
