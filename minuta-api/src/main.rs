//! minuta-api - Project dashboard backend
//!
//! Authenticated users upload meeting transcripts; the service analyzes
//! them with OpenAI and materializes the analysis into project phases and
//! requirements.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use minuta_api::config::Settings;
use minuta_api::services::{OpenAiClient, TranscriptPipeline};
use minuta_api::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting minuta-api");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::resolve()?;
    info!("Database: {}", settings.database_path.display());

    let db_pool = minuta_api::db::init_database_pool(&settings.database_path).await?;
    info!("Database connection established");

    let analyzer = OpenAiClient::new(
        settings.openai_api_key.clone(),
        settings.openai_model.clone(),
        settings.request_timeout_secs,
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize OpenAI client: {}", e))?;

    let pipeline = Arc::new(TranscriptPipeline::new(
        db_pool.clone(),
        Arc::new(analyzer),
        settings.max_concurrent_analyses,
    ));

    let state = AppState::new(db_pool, pipeline);
    let app = minuta_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Listening on http://{}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
