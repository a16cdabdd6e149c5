//! Configuration management module
//!
//! This module holds the typed dashboard settings, the loader that validates
//! settings documents into them, the renderer that writes them back out for
//! the host, and the preferences of the command-line tool itself.

pub mod datasource;
pub mod loader;
pub mod preferences;
pub mod render;
pub mod secret;
pub mod settings;
pub mod timespan;

pub use datasource::{DataSource, DataSourceType, SourceUrl};
pub use loader::{load, load_file, load_str, DocumentFormat};
pub use preferences::Preferences;
pub use secret::Secret;
pub use settings::*;
pub use timespan::Timespan;
