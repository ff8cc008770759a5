//! Pipeline orchestrator tests
//!
//! Exercise the full claim → analyze → normalize → persist → materialize
//! sequence against a throwaway database and a scripted analyzer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use uuid::Uuid;

use minuta_api::db::transcripts::{self, NewTranscript};
use minuta_api::db::{init_database_pool, phases, requirements};
use minuta_api::models::TranscriptStatus;
use minuta_api::services::{AnalyzerError, PipelineError, TranscriptAnalyzer, TranscriptPipeline};

/// Analyzer that replays a queue of canned outcomes
struct ScriptedAnalyzer {
    responses: Mutex<VecDeque<Result<String, AnalyzerError>>>,
}

impl ScriptedAnalyzer {
    fn new(responses: Vec<Result<String, AnalyzerError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait::async_trait]
impl TranscriptAnalyzer for ScriptedAnalyzer {
    async fn analyze(
        &self,
        _transcription_text: &str,
        _project_context: Option<&str>,
    ) -> Result<String, AnalyzerError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted response left")
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }
}

async fn test_pool() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database_pool(&dir.path().join("minuta.db"))
        .await
        .unwrap();
    (pool, dir)
}

async fn create_transcript(pool: &SqlitePool, project_id: Option<Uuid>) -> Uuid {
    let transcript = transcripts::create(
        pool,
        NewTranscript {
            transcription_text: "Hablamos del alcance del CRM".to_string(),
            user_email: "ana@example.com".to_string(),
            meeting_id: None,
            project_id,
            language: "es".to_string(),
            source: "teams".to_string(),
        },
    )
    .await
    .unwrap();

    transcript.id
}

fn pipeline(pool: &SqlitePool, analyzer: Arc<ScriptedAnalyzer>) -> TranscriptPipeline {
    TranscriptPipeline::new(pool.clone(), analyzer, 4)
}

const TWO_PHASE_ANALYSIS: &str = r#"{
    "summary": "Alcance inicial acordado",
    "phases": [
        {"name": "Design", "description": "Wireframes", "order": 1},
        {"name": "Build", "description": "Implementación", "order": 2}
    ],
    "requirements": [
        {"title": "Exportar PDF", "description": "Reportes", "type": "functional", "priority": "high", "phase": "Build"}
    ]
}"#;

#[tokio::test]
async fn successful_process_persists_analysis_and_materializes() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();
    let transcript_id = create_transcript(&pool, Some(project_id)).await;

    let analyzer = ScriptedAnalyzer::new(vec![Ok(TWO_PHASE_ANALYSIS.to_string())]);
    let result = pipeline(&pool, analyzer)
        .process(transcript_id, Some("CRM interno"))
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptStatus::Completed);
    assert!(result.error_message.is_none());
    assert_eq!(result.ai_model_used.as_deref(), Some("scripted-model"));
    assert!(result.processed_at.is_some());

    let analysis = result.ai_analysis.unwrap();
    assert_eq!(analysis.summary, "Alcance inicial acordado");
    assert_eq!(analysis.phases.len(), 2);

    // Materialized records: 2 phases, 1 requirement bound to "Build"
    let project_phases = phases::get_by_project(&pool, project_id).await.unwrap();
    assert_eq!(project_phases.len(), 2);
    let build_phase = project_phases.iter().find(|p| p.name == "Build").unwrap();

    let reqs = requirements::get_by_phase(&pool, build_phase.id).await.unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].title, "Exportar PDF");
    assert!(reqs[0].extracted_by_ai);
    assert!(!reqs[0].user_edited);
    assert_eq!(reqs[0].transcription_id, Some(transcript_id));
}

#[tokio::test]
async fn process_without_project_never_materializes() {
    let (pool, _dir) = test_pool().await;
    let transcript_id = create_transcript(&pool, None).await;

    let analyzer = ScriptedAnalyzer::new(vec![Ok(TWO_PHASE_ANALYSIS.to_string())]);
    let result = pipeline(&pool, analyzer)
        .process(transcript_id, None)
        .await
        .unwrap();

    assert_eq!(result.status, TranscriptStatus::Completed);

    let phase_count = phases::count(&pool, None, None).await.unwrap();
    let req_count = requirements::count(&pool, &Default::default()).await.unwrap();
    assert_eq!(phase_count, 0);
    assert_eq!(req_count, 0);
}

#[tokio::test]
async fn unknown_transcript_is_not_found() {
    let (pool, _dir) = test_pool().await;
    let analyzer = ScriptedAnalyzer::new(vec![]);

    let err = pipeline(&pool, analyzer)
        .process(Uuid::new_v4(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::NotFound(_)));
}

#[tokio::test]
async fn analyzer_timeout_records_error_and_preserves_prior_analysis() {
    let (pool, _dir) = test_pool().await;
    let transcript_id = create_transcript(&pool, None).await;

    // First run succeeds, second times out
    let analyzer = ScriptedAnalyzer::new(vec![
        Ok(TWO_PHASE_ANALYSIS.to_string()),
        Err(AnalyzerError::Timeout),
    ]);
    let pipeline = pipeline(&pool, analyzer);

    let first = pipeline.process(transcript_id, None).await.unwrap();
    let first_analysis = first.ai_analysis.clone().unwrap();

    let err = pipeline.process(transcript_id, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::ExternalService(_)));

    let after = transcripts::get(&pool, transcript_id).await.unwrap().unwrap();
    assert_eq!(after.status, TranscriptStatus::Error);
    assert!(!after.error_message.unwrap().is_empty());
    // Prior analysis untouched, not overwritten with partial data
    assert_eq!(after.ai_analysis.unwrap(), first_analysis);
}

#[tokio::test]
async fn malformed_response_is_an_error_not_an_empty_analysis() {
    let (pool, _dir) = test_pool().await;
    let transcript_id = create_transcript(&pool, None).await;

    let analyzer = ScriptedAnalyzer::new(vec![Ok(r#"{"requirements": 42}"#.to_string())]);
    let err = pipeline(&pool, analyzer)
        .process(transcript_id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::MalformedResponse(_)));

    let after = transcripts::get(&pool, transcript_id).await.unwrap().unwrap();
    assert_eq!(after.status, TranscriptStatus::Error);
    assert!(after.error_message.is_some());
    assert!(after.ai_analysis.is_none());
}

#[tokio::test]
async fn store_failure_on_completed_commit_releases_the_claim() {
    let (pool, _dir) = test_pool().await;
    let transcript_id = create_transcript(&pool, None).await;

    // Abort only the completed commit at the store layer
    sqlx::query(
        r#"
        CREATE TRIGGER block_completed BEFORE UPDATE ON transcripts
        WHEN NEW.status = 'completed'
        BEGIN
            SELECT RAISE(ABORT, 'disk full');
        END
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let analyzer = ScriptedAnalyzer::new(vec![
        Ok(TWO_PHASE_ANALYSIS.to_string()),
        Ok(TWO_PHASE_ANALYSIS.to_string()),
    ]);
    let pipeline = pipeline(&pool, analyzer);

    let err = pipeline.process(transcript_id, None).await.unwrap_err();
    assert!(matches!(err, PipelineError::Storage(_)));

    // The failure is written back; the row is not stuck in processing
    let after = transcripts::get(&pool, transcript_id).await.unwrap().unwrap();
    assert_eq!(after.status, TranscriptStatus::Error);
    assert!(after.error_message.is_some());

    // With the store healthy again, a retry claims and completes normally
    sqlx::query("DROP TRIGGER block_completed")
        .execute(&pool)
        .await
        .unwrap();

    let retried = pipeline.process(transcript_id, None).await.unwrap();
    assert_eq!(retried.status, TranscriptStatus::Completed);
}

#[tokio::test]
async fn concurrent_claim_is_rejected_with_conflict() {
    let (pool, _dir) = test_pool().await;
    let transcript_id = create_transcript(&pool, None).await;

    // Simulate an in-flight run holding the claim
    assert!(transcripts::claim_processing(&pool, transcript_id).await.unwrap());

    let analyzer = ScriptedAnalyzer::new(vec![Ok(TWO_PHASE_ANALYSIS.to_string())]);
    let err = pipeline(&pool, analyzer)
        .process(transcript_id, None)
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::AlreadyProcessing(_)));
}

#[tokio::test]
async fn reprocessing_overwrites_analysis_but_duplicates_materialization() {
    let (pool, _dir) = test_pool().await;
    let project_id = Uuid::new_v4();
    let transcript_id = create_transcript(&pool, Some(project_id)).await;

    let second_analysis = r#"{
        "summary": "Segunda pasada",
        "phases": [{"name": "Design", "order": 1}, {"name": "Build", "order": 2}],
        "requirements": [{"title": "Exportar PDF", "phase": "Build"}]
    }"#;

    let analyzer = ScriptedAnalyzer::new(vec![
        Ok(TWO_PHASE_ANALYSIS.to_string()),
        Ok(second_analysis.to_string()),
    ]);
    let pipeline = pipeline(&pool, analyzer);

    pipeline.process(transcript_id, None).await.unwrap();
    let second = pipeline.process(transcript_id, None).await.unwrap();

    // Analysis reflects only the second run
    assert_eq!(second.ai_analysis.unwrap().summary, "Segunda pasada");

    // Materialization from both runs accumulates; no deduplication
    let phase_count = phases::count(&pool, Some(project_id), None).await.unwrap();
    assert_eq!(phase_count, 4);
    let req_filter = minuta_api::db::requirements::RequirementFilter {
        project_id: Some(project_id),
        ..Default::default()
    };
    let req_count = requirements::count(&pool, &req_filter).await.unwrap();
    assert_eq!(req_count, 2);
}
