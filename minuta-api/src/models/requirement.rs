//! Requirement record
//!
//! A requirement always belongs to exactly one phase of its project. It may
//! be created manually or extracted by the transcript pipeline
//! (`extracted_by_ai`); the first human edit of title/description/priority/
//! type flips `user_edited`.

use chrono::{DateTime, Utc};
use minuta_common::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Requirement classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementType {
    Functional,
    NonFunctional,
    Technical,
    Business,
}

impl RequirementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementType::Functional => "functional",
            RequirementType::NonFunctional => "non_functional",
            RequirementType::Technical => "technical",
            RequirementType::Business => "business",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "functional" => Ok(RequirementType::Functional),
            "non_functional" => Ok(RequirementType::NonFunctional),
            "technical" => Ok(RequirementType::Technical),
            "business" => Ok(RequirementType::Business),
            other => Err(Error::Internal(format!(
                "Unknown requirement type: {}",
                other
            ))),
        }
    }
}

/// Requirement priority, classified by the model from conversational tone
/// for extracted requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl RequirementPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementPriority::Low => "low",
            RequirementPriority::Medium => "medium",
            RequirementPriority::High => "high",
            RequirementPriority::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "low" => Ok(RequirementPriority::Low),
            "medium" => Ok(RequirementPriority::Medium),
            "high" => Ok(RequirementPriority::High),
            "critical" => Ok(RequirementPriority::Critical),
            other => Err(Error::Internal(format!(
                "Unknown requirement priority: {}",
                other
            ))),
        }
    }
}

/// Requirement lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
}

impl RequirementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementStatus::Pending => "pending",
            RequirementStatus::InProgress => "in_progress",
            RequirementStatus::Completed => "completed",
            RequirementStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "pending" => Ok(RequirementStatus::Pending),
            "in_progress" => Ok(RequirementStatus::InProgress),
            "completed" => Ok(RequirementStatus::Completed),
            "rejected" => Ok(RequirementStatus::Rejected),
            other => Err(Error::Internal(format!(
                "Unknown requirement status: {}",
                other
            ))),
        }
    }
}

/// Discrete project need, bound to exactly one phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    /// Owning phase (always set)
    pub phase_id: Uuid,

    /// Originating transcript for extracted requirements
    pub transcription_id: Option<Uuid>,

    pub title: String,
    pub description: String,

    #[serde(rename = "type")]
    pub requirement_type: RequirementType,
    pub priority: RequirementPriority,
    pub status: RequirementStatus,

    /// True when created by the transcript pipeline
    pub extracted_by_ai: bool,

    /// True once a human has modified title/description/priority/type
    pub user_edited: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
