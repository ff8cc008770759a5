//! Materializer: analysis result → persisted phase and requirement rows
//!
//! Best-effort batch append: a mid-sequence store failure leaves the rows
//! created so far in place. The returned summary lets callers compare
//! created counts against the persisted analysis to detect partial
//! materialization.

use sqlx::SqlitePool;
use std::collections::HashMap;
use uuid::Uuid;

use minuta_common::Result;

use crate::db::phases::{self, NewPhase};
use crate::db::requirements::{self, NewRequirement};
use crate::models::AnalysisResult;

/// Counts of what one materialization pass created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializationSummary {
    pub phases_created: usize,
    pub requirements_created: usize,
    /// Requirement descriptors dropped because no phases were created
    pub requirements_skipped: usize,
}

/// Create phase and requirement rows from a normalized analysis
///
/// Phases are created in list order; duplicate names resolve
/// last-write-wins in the name→id mapping. A requirement whose phase label
/// matches nothing falls back to the first created phase; with no phases at
/// all it is skipped.
pub async fn materialize(
    pool: &SqlitePool,
    project_id: Uuid,
    transcription_id: Uuid,
    result: &AnalysisResult,
) -> Result<MaterializationSummary> {
    let mut summary = MaterializationSummary::default();

    let mut phase_ids_by_name: HashMap<String, Uuid> = HashMap::new();
    let mut first_phase_id: Option<Uuid> = None;

    for descriptor in &result.phases {
        let description = if descriptor.description.is_empty() {
            None
        } else {
            Some(descriptor.description.clone())
        };

        let phase = phases::create(
            pool,
            NewPhase::pending(
                project_id,
                descriptor.name.clone(),
                description,
                descriptor.order,
            ),
        )
        .await?;

        tracing::debug!(phase_id = %phase.id, name = %phase.name, "Created phase from analysis");

        phase_ids_by_name.insert(descriptor.name.clone(), phase.id);
        first_phase_id.get_or_insert(phase.id);
        summary.phases_created += 1;
    }

    for descriptor in &result.requirements {
        let phase_id = phase_ids_by_name
            .get(&descriptor.phase)
            .copied()
            .or(first_phase_id);

        let Some(phase_id) = phase_id else {
            tracing::warn!(
                title = %descriptor.title,
                "Skipping requirement: analysis produced no phases to attach it to"
            );
            summary.requirements_skipped += 1;
            continue;
        };

        let requirement = requirements::create(
            pool,
            NewRequirement {
                project_id,
                phase_id,
                transcription_id: Some(transcription_id),
                title: descriptor.title.clone(),
                description: descriptor.description.clone(),
                requirement_type: descriptor.requirement_type,
                priority: descriptor.priority,
                extracted_by_ai: true,
            },
        )
        .await?;

        tracing::debug!(
            requirement_id = %requirement.id,
            phase_id = %phase_id,
            "Created requirement from analysis"
        );
        summary.requirements_created += 1;
    }

    tracing::info!(
        project_id = %project_id,
        transcription_id = %transcription_id,
        phases = summary.phases_created,
        requirements = summary.requirements_created,
        skipped = summary.requirements_skipped,
        "Materialized analysis into project records"
    );

    Ok(summary)
}
