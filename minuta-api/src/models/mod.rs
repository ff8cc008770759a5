//! Domain models for minuta-api

pub mod analysis;
pub mod phase;
pub mod requirement;
pub mod transcript;

pub use analysis::{
    ActionItem, AnalysisResult, PhaseDescriptor, RequirementDescriptor, TechnicalDecision,
};
pub use phase::{PhaseStatus, ProjectPhase};
pub use requirement::{Requirement, RequirementPriority, RequirementStatus, RequirementType};
pub use transcript::{Transcript, TranscriptStatus};
