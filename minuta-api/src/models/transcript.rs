//! Transcript record and processing state machine
//!
//! A transcript progresses through four states:
//! PENDING → PROCESSING → COMPLETED or ERROR
//!
//! Re-entrant: a new `process` call on a completed or errored transcript
//! moves it back to PROCESSING. Only the pipeline orchestrator writes
//! status transitions.

use chrono::{DateTime, Utc};
use minuta_common::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::AnalysisResult;

/// Transcript processing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptStatus {
    /// Created, not yet analyzed
    Pending,
    /// Analysis in flight (model call issued or imminent)
    Processing,
    /// Analysis persisted, no error
    Completed,
    /// Last attempt failed; error_message holds the cause
    Error,
}

impl TranscriptStatus {
    /// Stable string form used in the database and API filters
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptStatus::Pending => "pending",
            TranscriptStatus::Processing => "processing",
            TranscriptStatus::Completed => "completed",
            TranscriptStatus::Error => "error",
        }
    }

    /// Parse the stored string form
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "pending" => Ok(TranscriptStatus::Pending),
            "processing" => Ok(TranscriptStatus::Processing),
            "completed" => Ok(TranscriptStatus::Completed),
            "error" => Ok(TranscriptStatus::Error),
            other => Err(Error::Internal(format!(
                "Unknown transcript status: {}",
                other
            ))),
        }
    }
}

/// Stored meeting transcript and its AI-processing state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Unique transcript identifier
    pub id: Uuid,

    /// Full transcript text as uploaded
    pub transcription_text: String,

    /// Email of the submitting user
    pub user_email: String,

    /// Associated meeting, if any
    pub meeting_id: Option<Uuid>,

    /// Associated project; materialization only happens when set
    pub project_id: Option<Uuid>,

    /// Transcript language code (default "es")
    pub language: String,

    /// Origin tag: "teams", "manual", ...
    pub source: String,

    /// Processing state
    pub status: TranscriptStatus,

    /// Failure cause when status is Error
    pub error_message: Option<String>,

    /// Normalized analysis, persisted verbatim when status is Completed
    pub ai_analysis: Option<AnalysisResult>,

    /// Which model produced the analysis (e.g. "gpt-4-turbo-preview")
    pub ai_model_used: Option<String>,

    /// When the analysis completed
    pub processed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_string_form() {
        for status in [
            TranscriptStatus::Pending,
            TranscriptStatus::Processing,
            TranscriptStatus::Completed,
            TranscriptStatus::Error,
        ] {
            assert_eq!(TranscriptStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        assert!(TranscriptStatus::parse("done").is_err());
    }
}
