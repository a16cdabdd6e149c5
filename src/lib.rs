//! dashconf - Dashboard Settings Loader
//!
//! Validates the declarative settings document a dashboard host reads at
//! startup and turns it into typed, immutable settings.

pub mod cli;
pub mod config;
pub mod error;
pub mod utils;

// Re-export commonly used types
pub use config::{load, Settings};
pub use error::{DashconfError, Result};
