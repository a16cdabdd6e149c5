//! Command-line preferences
//!
//! Presentation settings for the `dashconf` binary itself, separate from the
//! dashboard settings documents it inspects. Sources in priority order:
//! 1. Command-line flags (applied by the CLI)
//! 2. `DASHCONF_` environment variables
//! 3. The preferences file
//! 4. Default values

use crate::error::{DashconfError, Result};
use crate::utils::format::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub output: OutputFormat,
    pub no_color: bool,
    pub show_secrets: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            output: OutputFormat::Table,
            no_color: false,
            show_secrets: false,
        }
    }
}

impl Preferences {
    pub fn get_config_path() -> Result<PathBuf> {
        // XDG layout on Linux and macOS, the platform directory elsewhere
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME").map_err(|_| {
                    DashconfError::invalid_argument("HOME environment variable not set")
                })?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("dashconf").join("dashconf.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir().ok_or_else(|| {
                DashconfError::invalid_argument("Unable to determine config directory")
            })?;
            Ok(config_dir.join("dashconf").join("dashconf.toml"))
        }
    }

    /// Load from the default preferences file and the environment
    pub fn load() -> Result<Self> {
        let path = Self::get_config_path()?;
        Self::load_from(&path)
    }

    /// Load from a specific file (which may be absent) and the environment
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading preferences from {}", path.display());

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml).required(false))
            .add_source(config::Environment::with_prefix("DASHCONF"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
