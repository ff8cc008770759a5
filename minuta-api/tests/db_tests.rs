//! Database operation tests
//!
//! Phase status side effects, requirement edit tracking, and the
//! conditional processing claim.

use sqlx::SqlitePool;
use uuid::Uuid;

use minuta_api::db::phases::{self, NewPhase};
use minuta_api::db::requirements::{self, NewRequirement, RequirementUpdate};
use minuta_api::db::transcripts::{self, NewTranscript};
use minuta_api::db::init_database_pool;
use minuta_api::models::{
    PhaseStatus, RequirementPriority, RequirementStatus, RequirementType, TranscriptStatus,
};

async fn test_pool() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database_pool(&dir.path().join("minuta.db"))
        .await
        .unwrap();
    (pool, dir)
}

async fn create_phase(pool: &SqlitePool, project_id: Uuid, name: &str, order: i64) -> Uuid {
    phases::create(pool, NewPhase::pending(project_id, name.to_string(), None, order))
        .await
        .unwrap()
        .id
}

async fn create_requirement(pool: &SqlitePool, project_id: Uuid, phase_id: Uuid) -> Uuid {
    requirements::create(
        pool,
        NewRequirement {
            project_id,
            phase_id,
            transcription_id: None,
            title: "Login SSO".to_string(),
            description: "Acceso corporativo".to_string(),
            requirement_type: RequirementType::Technical,
            priority: RequirementPriority::High,
            extracted_by_ai: false,
        },
    )
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn completing_a_phase_forces_completion_to_100() {
    let (pool, _dir) = test_pool().await;
    let phase_id = create_phase(&pool, Uuid::new_v4(), "Diseño", 1).await;

    phases::update_completion(&pool, phase_id, 40).await.unwrap();

    let phase = phases::update_status(&pool, phase_id, PhaseStatus::Completed)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(phase.status, PhaseStatus::Completed);
    assert_eq!(phase.completion_percentage, 100);
    assert!(phase.actual_end_date.is_some());
}

#[tokio::test]
async fn first_in_progress_transition_sets_actual_start_once() {
    let (pool, _dir) = test_pool().await;
    let phase_id = create_phase(&pool, Uuid::new_v4(), "Desarrollo", 1).await;

    let phase = phases::update_status(&pool, phase_id, PhaseStatus::InProgress)
        .await
        .unwrap()
        .unwrap();
    let started = phase.actual_start_date.expect("start date should be set");

    // Bounce through blocked and back; the original start date survives
    phases::update_status(&pool, phase_id, PhaseStatus::Blocked)
        .await
        .unwrap();
    let again = phases::update_status(&pool, phase_id, PhaseStatus::InProgress)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(again.actual_start_date, Some(started));
}

#[tokio::test]
async fn completion_percentage_outside_range_is_rejected() {
    let (pool, _dir) = test_pool().await;
    let phase_id = create_phase(&pool, Uuid::new_v4(), "Testing", 1).await;

    assert!(phases::update_completion(&pool, phase_id, 101).await.is_err());
    assert!(phases::update_completion(&pool, phase_id, -1).await.is_err());
    assert!(phases::update_completion(&pool, phase_id, 100).await.is_ok());
}

#[tokio::test]
async fn reorder_assigns_new_sequence_positions() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();
    let first = create_phase(&pool, project_id, "Análisis", 1).await;
    let second = create_phase(&pool, project_id, "Diseño", 2).await;

    phases::reorder(&pool, project_id, &[(first, 20), (second, 10)])
        .await
        .unwrap();

    let ordered = phases::get_by_project(&pool, project_id).await.unwrap();
    assert_eq!(ordered[0].id, second);
    assert_eq!(ordered[1].id, first);
}

#[tokio::test]
async fn content_edit_flips_user_edited() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();
    let phase_id = create_phase(&pool, project_id, "Diseño", 1).await;
    let req_id = create_requirement(&pool, project_id, phase_id).await;

    let before = requirements::get(&pool, req_id).await.unwrap().unwrap();
    assert!(!before.user_edited);

    // Status-only changes are not content edits
    requirements::update_status(&pool, req_id, RequirementStatus::InProgress)
        .await
        .unwrap();
    let after_status = requirements::get(&pool, req_id).await.unwrap().unwrap();
    assert!(!after_status.user_edited);

    let after_edit = requirements::update(
        &pool,
        req_id,
        RequirementUpdate {
            priority: Some(RequirementPriority::Critical),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert!(after_edit.user_edited);
    assert_eq!(after_edit.priority, RequirementPriority::Critical);
}

#[tokio::test]
async fn requirement_moves_between_phases() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();
    let phase_a = create_phase(&pool, project_id, "Diseño", 1).await;
    let phase_b = create_phase(&pool, project_id, "Desarrollo", 2).await;
    let req_id = create_requirement(&pool, project_id, phase_a).await;

    let moved = requirements::move_to_phase(&pool, req_id, phase_b)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(moved.phase_id, phase_b);
    // A move alone is not a content edit
    assert!(!moved.user_edited);
}

#[tokio::test]
async fn processing_claim_is_exclusive_and_reentrant() {
    let (pool, _dir) = test_pool().await;
    let transcript = transcripts::create(
        &pool,
        NewTranscript {
            transcription_text: "texto".to_string(),
            user_email: "ana@example.com".to_string(),
            meeting_id: None,
            project_id: None,
            language: "es".to_string(),
            source: "manual".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(transcript.status, TranscriptStatus::Pending);

    // First claim wins, second is refused while processing
    assert!(transcripts::claim_processing(&pool, transcript.id).await.unwrap());
    assert!(!transcripts::claim_processing(&pool, transcript.id).await.unwrap());

    // After a terminal state the claim is available again
    transcripts::mark_error(&pool, transcript.id, "timeout").await.unwrap();
    assert!(transcripts::claim_processing(&pool, transcript.id).await.unwrap());
}

#[tokio::test]
async fn missing_rows_report_not_found_semantics() {
    let (pool, _dir) = test_pool().await;

    assert!(transcripts::get(&pool, Uuid::new_v4()).await.unwrap().is_none());
    assert!(!transcripts::delete(&pool, Uuid::new_v4()).await.unwrap());
    assert!(phases::update_status(&pool, Uuid::new_v4(), PhaseStatus::Completed)
        .await
        .unwrap()
        .is_none());
    assert!(requirements::move_to_phase(&pool, Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}
