//! Response parser: raw model output → normalized `AnalysisResult`
//!
//! Pure with respect to its input; performs no I/O. Absent optional fields
//! default, but a present top-level collection that is not a list is a
//! malformed response — it is never silently defaulted into an empty
//! analysis.

use minuta_common::Error;
use serde_json::Value;

use crate::models::{
    ActionItem, AnalysisResult, PhaseDescriptor, RequirementDescriptor, RequirementPriority,
    RequirementType, TechnicalDecision,
};

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// Extract a top-level collection, defaulting to empty when absent but
/// failing when present with a non-list value
fn list_field<'a>(root: &'a Value, key: &str) -> Result<Vec<&'a Value>, Error> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.iter().collect()),
        Some(_) => Err(Error::MalformedResponse(format!(
            "Field '{}' is not a list",
            key
        ))),
    }
}

/// Normalize raw model output into an `AnalysisResult`
///
/// Fails with `MalformedResponse` when the payload is not a JSON object or
/// a top-level collection has the wrong shape.
pub fn normalize(raw: &str) -> Result<AnalysisResult, Error> {
    let root: Value = serde_json::from_str(raw)
        .map_err(|e| Error::MalformedResponse(format!("Invalid JSON: {}", e)))?;

    if !root.is_object() {
        return Err(Error::MalformedResponse(
            "Top-level value is not a JSON object".to_string(),
        ));
    }

    let phases = list_field(&root, "phases")?
        .into_iter()
        .map(|phase| PhaseDescriptor {
            name: str_field(phase, "name"),
            description: str_field(phase, "description"),
            // Non-numeric order falls back to 1
            order: phase.get("order").and_then(Value::as_i64).unwrap_or(1),
            estimated_duration: opt_str_field(phase, "estimated_duration"),
        })
        .collect();

    let requirements = list_field(&root, "requirements")?
        .into_iter()
        .map(|req| RequirementDescriptor {
            title: str_field(req, "title"),
            description: str_field(req, "description"),
            requirement_type: req
                .get("type")
                .and_then(Value::as_str)
                .and_then(|s| RequirementType::parse(s).ok())
                .unwrap_or(RequirementType::Functional),
            priority: req
                .get("priority")
                .and_then(Value::as_str)
                .and_then(|s| RequirementPriority::parse(s).ok())
                .unwrap_or(RequirementPriority::Medium),
            phase: str_field(req, "phase"),
        })
        .collect();

    let technical_decisions = list_field(&root, "technical_decisions")?
        .into_iter()
        .map(|decision| TechnicalDecision {
            topic: str_field(decision, "topic"),
            decision: str_field(decision, "decision"),
            rationale: str_field(decision, "rationale"),
        })
        .collect();

    let action_items = list_field(&root, "action_items")?
        .into_iter()
        .map(|item| ActionItem {
            task: str_field(item, "task"),
            assigned_to: opt_str_field(item, "assigned_to"),
            deadline: opt_str_field(item, "deadline"),
        })
        .collect();

    Ok(AnalysisResult {
        summary: str_field(&root, "summary"),
        phases,
        requirements,
        technical_decisions,
        action_items,
    })
}
