//! Transcription API endpoints
//!
//! CRUD plus the processing trigger. A process call on a transcript that is
//! already in flight is rejected with 409.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use minuta_common::api::{Message, PaginatedResponse};

use crate::db::transcripts::{self, NewTranscript, TranscriptFilter, TranscriptUpdate};
use crate::models::{Transcript, TranscriptStatus};
use crate::services::PipelineError;
use crate::{ApiError, ApiResult, AppState};

fn default_language() -> String {
    "es".to_string()
}

fn default_source() -> String {
    "teams".to_string()
}

/// Request payload for creating a transcription
#[derive(Debug, Deserialize)]
pub struct CreateTranscriptionRequest {
    pub transcription_text: String,
    pub user_email: String,
    pub meeting_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_source")]
    pub source: String,
}

/// Request payload for direct field edits
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTranscriptionRequest {
    pub transcription_text: Option<String>,
    pub meeting_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub language: Option<String>,
    pub source: Option<String>,
}

/// Request payload for the processing trigger
#[derive(Debug, Default, Deserialize)]
pub struct ProcessRequest {
    /// Optional free-text project context forwarded to the model
    pub project_context: Option<String>,
}

/// List query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub user_email: Option<String>,
    pub project_id: Option<Uuid>,
    pub status: Option<String>,
}

fn default_limit() -> i64 {
    10
}

/// POST /api/transcriptions
pub async fn create_transcription(
    State(state): State<AppState>,
    Json(payload): Json<CreateTranscriptionRequest>,
) -> ApiResult<(StatusCode, Json<Transcript>)> {
    if payload.transcription_text.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Transcription text cannot be empty".to_string(),
        ));
    }

    let transcript = transcripts::create(
        &state.db,
        NewTranscript {
            transcription_text: payload.transcription_text,
            user_email: payload.user_email,
            meeting_id: payload.meeting_id,
            project_id: payload.project_id,
            language: payload.language,
            source: payload.source,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(transcript)))
}

/// GET /api/transcriptions
pub async fn list_transcriptions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PaginatedResponse<Transcript>>> {
    let status = query
        .status
        .as_deref()
        .map(TranscriptStatus::parse)
        .transpose()
        .map_err(|_| ApiError::BadRequest("Unknown status filter".to_string()))?;

    let filter = TranscriptFilter {
        user_email: query.user_email,
        project_id: query.project_id,
        status,
    };

    let skip = query.skip.max(0);
    let limit = query.limit.clamp(1, 100);

    let items = transcripts::list(&state.db, &filter, skip, limit).await?;
    let total = transcripts::count(&state.db, &filter).await?;

    Ok(Json(PaginatedResponse::new(items, total, skip, limit)))
}

/// GET /api/transcriptions/:id
pub async fn get_transcription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Transcript>> {
    let transcript = transcripts::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Transcription {}", id)))?;

    Ok(Json(transcript))
}

/// PUT /api/transcriptions/:id
pub async fn update_transcription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTranscriptionRequest>,
) -> ApiResult<Json<Transcript>> {
    let updated = transcripts::update(
        &state.db,
        id,
        TranscriptUpdate {
            transcription_text: payload.transcription_text,
            meeting_id: payload.meeting_id,
            project_id: payload.project_id,
            language: payload.language,
            source: payload.source,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("Transcription {}", id)))?;

    Ok(Json(updated))
}

/// DELETE /api/transcriptions/:id
pub async fn delete_transcription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Message>> {
    if !transcripts::delete(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Transcription {}", id)));
    }

    Ok(Json(Message::new("Transcription deleted")))
}

/// POST /api/transcriptions/:id/process
///
/// Runs the analysis pipeline and returns the final transcript state.
pub async fn process_transcription(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProcessRequest>,
) -> ApiResult<Json<Transcript>> {
    let transcript = state
        .pipeline
        .process(id, payload.project_context.as_deref())
        .await
        .map_err(|e| match e {
            PipelineError::NotFound(id) => ApiError::NotFound(format!("Transcription {}", id)),
            PipelineError::AlreadyProcessing(_) => {
                ApiError::Conflict("Transcription is already being processed".to_string())
            }
            PipelineError::ExternalService(msg) | PipelineError::MalformedResponse(msg) => {
                ApiError::Upstream(msg)
            }
            PipelineError::Materialization(msg) => ApiError::Internal(msg),
            PipelineError::Storage(err) => ApiError::Common(err),
        })?;

    Ok(Json(transcript))
}

/// Build transcription routes
pub fn transcription_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/transcriptions",
            post(create_transcription).get(list_transcriptions),
        )
        .route(
            "/api/transcriptions/:id",
            get(get_transcription)
                .put(update_transcription)
                .delete(delete_transcription),
        )
        .route("/api/transcriptions/:id/process", post(process_transcription))
}
