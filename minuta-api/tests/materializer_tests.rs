//! Materializer tests
//!
//! Phase-name mapping determinism: matched labels bind to their phase,
//! unmatched labels fall back to the first created phase, and with no
//! phases at all the requirement is skipped.

use sqlx::SqlitePool;
use uuid::Uuid;

use minuta_api::db::{init_database_pool, phases, requirements};
use minuta_api::models::{
    AnalysisResult, PhaseDescriptor, PhaseStatus, RequirementDescriptor, RequirementPriority,
    RequirementType,
};
use minuta_api::services::materialize;

async fn test_pool() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database_pool(&dir.path().join("minuta.db"))
        .await
        .unwrap();
    (pool, dir)
}

fn phase_descriptor(name: &str, order: i64) -> PhaseDescriptor {
    PhaseDescriptor {
        name: name.to_string(),
        description: format!("Fase {}", name),
        order,
        estimated_duration: None,
    }
}

fn requirement_descriptor(title: &str, phase: &str) -> RequirementDescriptor {
    RequirementDescriptor {
        title: title.to_string(),
        description: String::new(),
        requirement_type: RequirementType::Functional,
        priority: RequirementPriority::Medium,
        phase: phase.to_string(),
    }
}

#[tokio::test]
async fn requirement_binds_to_its_named_phase() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();
    let transcript_id = Uuid::new_v4();

    let analysis = AnalysisResult {
        phases: vec![phase_descriptor("Design", 1), phase_descriptor("Build", 2)],
        requirements: vec![requirement_descriptor("Exportar PDF", "Build")],
        ..Default::default()
    };

    let summary = materialize(&pool, project_id, transcript_id, &analysis)
        .await
        .unwrap();
    assert_eq!(summary.phases_created, 2);
    assert_eq!(summary.requirements_created, 1);
    assert_eq!(summary.requirements_skipped, 0);

    let created = phases::get_by_project(&pool, project_id).await.unwrap();
    assert_eq!(created.len(), 2);
    let build = created.iter().find(|p| p.name == "Build").unwrap();
    let design = created.iter().find(|p| p.name == "Design").unwrap();

    // Phases come out pending with zero completion
    assert_eq!(build.status, PhaseStatus::Pending);
    assert_eq!(build.completion_percentage, 0);

    let reqs = requirements::get_by_phase(&pool, build.id).await.unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].phase_id, build.id);
    assert_ne!(reqs[0].phase_id, design.id);
}

#[tokio::test]
async fn unmatched_label_falls_back_to_first_created_phase() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();

    let analysis = AnalysisResult {
        phases: vec![phase_descriptor("Análisis", 1), phase_descriptor("Diseño", 2)],
        requirements: vec![requirement_descriptor("Login SSO", "Despliegue")],
        ..Default::default()
    };

    materialize(&pool, project_id, Uuid::new_v4(), &analysis)
        .await
        .unwrap();

    let created = phases::get_by_project(&pool, project_id).await.unwrap();
    let first = created.iter().find(|p| p.name == "Análisis").unwrap();

    let reqs = requirements::get_by_phase(&pool, first.id).await.unwrap();
    assert_eq!(reqs.len(), 1, "unmatched requirement should land on the first phase");
}

#[tokio::test]
async fn zero_phases_means_zero_requirements() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();

    let analysis = AnalysisResult {
        requirements: vec![requirement_descriptor("Huérfano", "Fase X")],
        ..Default::default()
    };

    let summary = materialize(&pool, project_id, Uuid::new_v4(), &analysis)
        .await
        .unwrap();

    assert_eq!(summary.phases_created, 0);
    assert_eq!(summary.requirements_created, 0);
    assert_eq!(summary.requirements_skipped, 1);

    let req_count = requirements::count(&pool, &Default::default()).await.unwrap();
    assert_eq!(req_count, 0);
}

#[tokio::test]
async fn duplicate_phase_names_resolve_last_write_wins() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();

    let analysis = AnalysisResult {
        phases: vec![phase_descriptor("Build", 1), phase_descriptor("Build", 2)],
        requirements: vec![requirement_descriptor("Exportar PDF", "Build")],
        ..Default::default()
    };

    materialize(&pool, project_id, Uuid::new_v4(), &analysis)
        .await
        .unwrap();

    let created = phases::get_by_project(&pool, project_id).await.unwrap();
    assert_eq!(created.len(), 2);

    // The later duplicate owns the label
    let second = created.iter().find(|p| p.order == 2).unwrap();
    let reqs = requirements::get_by_phase(&pool, second.id).await.unwrap();
    assert_eq!(reqs.len(), 1);
}
