//! Project phase record
//!
//! Phases are ordered within their project by the caller-controlled
//! `order` field (ascending, not required consecutive).

use chrono::{DateTime, Utc};
use minuta_common::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl PhaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::Completed => "completed",
            PhaseStatus::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "pending" => Ok(PhaseStatus::Pending),
            "in_progress" => Ok(PhaseStatus::InProgress),
            "completed" => Ok(PhaseStatus::Completed),
            "blocked" => Ok(PhaseStatus::Blocked),
            other => Err(Error::Internal(format!("Unknown phase status: {}", other))),
        }
    }
}

/// Named stage of a project's lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPhase {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    pub name: String,
    pub description: Option<String>,
    pub status: PhaseStatus,

    /// Position within the project's phase sequence
    pub order: i64,

    /// 0-100 inclusive; forced to 100 when status becomes Completed
    pub completion_percentage: i64,

    pub planned_start_date: Option<DateTime<Utc>>,
    pub planned_end_date: Option<DateTime<Utc>>,

    /// Set the first time status becomes InProgress
    pub actual_start_date: Option<DateTime<Utc>>,

    /// Set when status becomes Completed
    pub actual_end_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
