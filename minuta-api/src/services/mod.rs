//! Service layer for minuta-api
//!
//! The transcript pipeline lives here: the OpenAI client behind the
//! `TranscriptAnalyzer` seam, the pure response parser, the materializer
//! that turns analyses into phase/requirement rows, and the orchestrator
//! that drives the whole sequence.

pub mod materializer;
pub mod openai;
pub mod parser;
pub mod pipeline;

pub use materializer::{materialize, MaterializationSummary};
pub use openai::{AnalyzerError, OpenAiClient, TranscriptAnalyzer};
pub use parser::normalize;
pub use pipeline::{PipelineError, TranscriptPipeline};
