//! Normalized model analysis
//!
//! Intermediate representation produced by the response parser and stored
//! verbatim on the transcript. Produced fresh on each processing attempt;
//! fully replaces any prior value.

use serde::{Deserialize, Serialize};

use crate::models::{RequirementPriority, RequirementType};

/// Normalized result of analyzing one transcript
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Executive summary of the meeting
    #[serde(default)]
    pub summary: String,

    /// Project phases identified in the conversation, in model order
    #[serde(default)]
    pub phases: Vec<PhaseDescriptor>,

    /// Requirements mentioned in the conversation, in model order
    #[serde(default)]
    pub requirements: Vec<RequirementDescriptor>,

    /// Technologies, architectures and patterns decided on
    #[serde(default)]
    pub technical_decisions: Vec<TechnicalDecision>,

    /// Follow-up tasks
    #[serde(default)]
    pub action_items: Vec<ActionItem>,
}

/// One phase as described by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Position hint from the model; defaults to 1
    #[serde(default = "default_order")]
    pub order: i64,
    #[serde(default)]
    pub estimated_duration: Option<String>,
}

fn default_order() -> i64 {
    1
}

/// One requirement as described by the model
///
/// `phase` is the free-text phase-name label the materializer resolves
/// against the phases created from the same analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementDescriptor {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_requirement_type")]
    pub requirement_type: RequirementType,
    #[serde(default = "default_priority")]
    pub priority: RequirementPriority,
    #[serde(default)]
    pub phase: String,
}

fn default_requirement_type() -> RequirementType {
    RequirementType::Functional
}

fn default_priority() -> RequirementPriority {
    RequirementPriority::Medium
}

/// A technical decision captured from the discussion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalDecision {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub decision: String,
    #[serde(default)]
    pub rationale: String,
}

/// A follow-up task captured from the discussion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}
