//! # Minuta Common Library
//!
//! Shared code for the Minuta backend:
//! - Error and result types
//! - Configuration loading (TOML + environment)
//! - API envelope types (pagination, messages)

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
