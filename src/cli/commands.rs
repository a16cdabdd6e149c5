//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands and their arguments.

use crate::config::loader::{apply_env_overrides, load, read_document, DocumentFormat};
use crate::config::render::{render_js_module, render_json, SAMPLE_MODULE};
use crate::config::{Preferences, Settings};
use crate::error::Result;
use crate::utils::format::{format_as_json, format_as_yaml, DisplayUtils, OutputFormat, TableFormatter};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "dashconf")]
#[command(about = "Validate and inspect dashboard host settings documents")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that a settings document is valid
    Validate {
        /// Settings document (.js, .json, .json5, .yaml, .toml)
        file: PathBuf,
        /// Document format, detected from the extension when omitted
        #[arg(long, value_enum)]
        format: Option<DocumentFormat>,
        /// Ignore DASHCONF_* environment overrides
        #[arg(long)]
        no_env: bool,
    },
    /// Print the loaded settings
    Show {
        /// Settings document
        file: PathBuf,
        /// Document format, detected from the extension when omitted
        #[arg(long, value_enum)]
        format: Option<DocumentFormat>,
        /// Output format
        #[arg(long, value_enum)]
        output: Option<OutputFormat>,
        /// Print credentials instead of a placeholder
        #[arg(long)]
        show_secrets: bool,
        /// Ignore DASHCONF_* environment overrides
        #[arg(long)]
        no_env: bool,
    },
    /// Write the normalized settings module for the host
    Render {
        /// Settings document
        file: PathBuf,
        /// Document format, detected from the extension when omitted
        #[arg(long, value_enum)]
        format: Option<DocumentFormat>,
        /// Destination file, stdout when omitted
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Emit plain JSON instead of the host module
        #[arg(long)]
        json: bool,
        /// Ignore DASHCONF_* environment overrides
        #[arg(long)]
        no_env: bool,
    },
    /// Print a sample settings module
    Sample,
}

impl Cli {
    pub async fn execute(self, preferences: Preferences) -> Result<()> {
        let no_color = self.no_color || preferences.no_color;
        let display = DisplayUtils::new(no_color);

        match self.command {
            Commands::Validate {
                file,
                format,
                no_env,
            } => execute_validate(&file, format, no_env, &display).await,
            Commands::Show {
                file,
                format,
                output,
                show_secrets,
                no_env,
            } => {
                let settings = acquire_settings(&file, format, no_env).await?;
                let output = output.unwrap_or(preferences.output);
                let show_secrets = show_secrets || preferences.show_secrets;
                execute_show(&settings, output, show_secrets, no_color, &display)
            }
            Commands::Render {
                file,
                format,
                out,
                json,
                no_env,
            } => {
                let settings = acquire_settings(&file, format, no_env).await?;
                execute_render(&settings, out.as_deref(), json, &display).await
            }
            Commands::Sample => {
                print!("{}", SAMPLE_MODULE);
                Ok(())
            }
        }
    }
}

/// Read a document, apply environment overrides and load it
pub async fn acquire_settings(
    file: &Path,
    format: Option<DocumentFormat>,
    no_env: bool,
) -> Result<Settings> {
    let mut document = read_document(file, format).await?;

    if !no_env {
        let applied = apply_env_overrides(&mut document, std::env::vars());
        if !applied.is_empty() {
            info!("Environment overrides applied: {}", applied.join(", "));
        }
    }

    load(&document)
}

async fn execute_validate(
    file: &Path,
    format: Option<DocumentFormat>,
    no_env: bool,
    display: &DisplayUtils,
) -> Result<()> {
    let settings = acquire_settings(file, format, no_env).await?;

    display.print_success(&format!(
        "{} is valid: {} data source(s)",
        file.display(),
        settings.datasources.len()
    ));

    if let Some(default) = settings.default_datasource() {
        display.print_info(&format!("Default data source: {}", default.name));
    }
    if let Some(store) = settings.metadata_store() {
        display.print_info(&format!("Dashboards stored in: {}", store.name));
    }
    if settings.datasources.iter().any(|source| source.has_credentials()) {
        display.print_warning("Credentials are stored in plain text in this document");
    }

    Ok(())
}

fn execute_show(
    settings: &Settings,
    output: OutputFormat,
    show_secrets: bool,
    no_color: bool,
    display: &DisplayUtils,
) -> Result<()> {
    debug!("Showing settings as {:?}", output);

    let visible = if show_secrets {
        settings.clone()
    } else {
        settings.redacted()
    };

    match output {
        OutputFormat::Json => println!("{}", format_as_json(&visible)?),
        OutputFormat::Yaml => print!("{}", format_as_yaml(&visible)?),
        OutputFormat::Table => {
            display.print_header("Data Sources");
            let formatter = TableFormatter::new(OutputFormat::Table, no_color);
            println!(
                "{}",
                formatter.format_table(&settings.datasource_rows(show_secrets))?
            );

            display.print_header("Settings");
            println!(
                "{}",
                display.format_key_value_pairs(&settings.summary(show_secrets))
            );
        }
    }

    Ok(())
}

async fn execute_render(
    settings: &Settings,
    out: Option<&Path>,
    json: bool,
    display: &DisplayUtils,
) -> Result<()> {
    let contents = if json {
        render_json(settings)?
    } else {
        render_js_module(settings)?
    };

    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            tokio::fs::write(path, contents).await?;
            display.print_success(&format!("Wrote {}", path.display()));
        }
        None => println!("{}", contents),
    }

    Ok(())
}
