//! Transcript processing orchestrator
//!
//! Drives one transcript through the full sequence: claim → model call →
//! normalize → persist → materialize. Every failure between the claim and a
//! successful completed commit is written back into the transcript's
//! status/error fields before being returned, including a failure of the
//! commit itself. The stored state never silently disagrees with what the
//! caller sees, and the claim is always released. Materializer failures after the completed commit are
//! surfaced but never rolled back: the expensive, non-idempotent model call
//! must not be re-triggered because the cheap, retriable materialization
//! step failed.

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::db::transcripts;
use crate::models::Transcript;
use crate::services::materializer;
use crate::services::openai::TranscriptAnalyzer;
use crate::services::parser;

/// Pipeline failure modes
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Transcript not found: {0}")]
    NotFound(Uuid),

    #[error("Transcript {0} is already being processed")]
    AlreadyProcessing(Uuid),

    /// Model call failed (network, auth, quota, timeout)
    #[error("Model call failed: {0}")]
    ExternalService(String),

    /// Model output failed normalization
    #[error("Model response failed normalization: {0}")]
    MalformedResponse(String),

    /// Phase/requirement creation failed after the transcript was already
    /// marked completed; nothing is rolled back
    #[error("Materialization failed after analysis was stored: {0}")]
    Materialization(String),

    #[error(transparent)]
    Storage(#[from] minuta_common::Error),
}

/// Orchestrates transcript analysis end to end
pub struct TranscriptPipeline {
    db: SqlitePool,
    analyzer: Arc<dyn TranscriptAnalyzer>,
    /// Bounds concurrent outbound model calls; held across the call only
    gate: Arc<Semaphore>,
}

impl TranscriptPipeline {
    pub fn new(
        db: SqlitePool,
        analyzer: Arc<dyn TranscriptAnalyzer>,
        max_concurrent_analyses: usize,
    ) -> Self {
        Self {
            db,
            analyzer,
            gate: Arc::new(Semaphore::new(max_concurrent_analyses.max(1))),
        }
    }

    /// Process one transcript and return its final state
    ///
    /// Re-entrant: invoking on a completed or errored transcript re-runs
    /// the full pipeline and overwrites the stored analysis. Each run that
    /// reaches materialization creates new phase/requirement rows; there is
    /// no deduplication against earlier runs.
    pub async fn process(
        &self,
        transcript_id: Uuid,
        project_context: Option<&str>,
    ) -> Result<Transcript, PipelineError> {
        let transcript = transcripts::get(&self.db, transcript_id)
            .await?
            .ok_or(PipelineError::NotFound(transcript_id))?;

        // Atomic claim: refuses when another process call holds the
        // transcript. Committed before the model call so concurrent reads
        // see in-flight work even if the call is slow.
        if !transcripts::claim_processing(&self.db, transcript_id).await? {
            return Err(PipelineError::AlreadyProcessing(transcript_id));
        }

        tracing::info!(transcript_id = %transcript_id, "Processing transcript");

        let raw = {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|_| PipelineError::ExternalService("Analyzer gate closed".to_string()))?;

            match self
                .analyzer
                .analyze(&transcript.transcription_text, project_context)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    let message = e.to_string();
                    self.record_failure(transcript_id, &message).await;
                    return Err(PipelineError::ExternalService(message));
                }
            }
        };

        // A malformed response is an error, not an empty analysis
        let analysis = match parser::normalize(&raw) {
            Ok(analysis) => analysis,
            Err(e) => {
                let message = e.to_string();
                self.record_failure(transcript_id, &message).await;
                return Err(PipelineError::MalformedResponse(message));
            }
        };

        // A store failure here must also be written back: leaving the row in
        // `processing` would block every future claim on this transcript.
        if let Err(e) = transcripts::mark_completed(
            &self.db,
            transcript_id,
            &analysis,
            self.analyzer.model_id(),
            Utc::now(),
        )
        .await
        {
            self.record_failure(transcript_id, &e.to_string()).await;
            return Err(PipelineError::Storage(e));
        }

        if let Some(project_id) = transcript.project_id {
            // The transcript stays completed even if this fails partway;
            // already-created rows remain.
            if let Err(e) =
                materializer::materialize(&self.db, project_id, transcript_id, &analysis).await
            {
                tracing::error!(
                    transcript_id = %transcript_id,
                    project_id = %project_id,
                    error = %e,
                    "Materialization failed; transcript remains completed"
                );
                return Err(PipelineError::Materialization(e.to_string()));
            }
        }

        match transcripts::get(&self.db, transcript_id).await {
            Ok(Some(transcript)) => Ok(transcript),
            Ok(None) => Err(PipelineError::NotFound(transcript_id)),
            Err(e) => {
                self.record_failure(transcript_id, &e.to_string()).await;
                Err(PipelineError::Storage(e))
            }
        }
    }

    /// Write a failure into the transcript's status/error fields
    ///
    /// A store failure here is logged rather than returned: the original
    /// failure is the one the caller needs to see.
    async fn record_failure(&self, transcript_id: Uuid, message: &str) {
        if let Err(db_err) = transcripts::mark_error(&self.db, transcript_id, message).await {
            tracing::error!(
                transcript_id = %transcript_id,
                error = %db_err,
                "Failed to record processing error on transcript"
            );
        }
    }
}
