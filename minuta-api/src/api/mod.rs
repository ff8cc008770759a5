//! API endpoints for minuta-api

pub mod health;
pub mod phases;
pub mod requirements;
pub mod transcriptions;

pub use health::health_routes;
pub use phases::phase_routes;
pub use requirements::requirement_routes;
pub use transcriptions::transcription_routes;
