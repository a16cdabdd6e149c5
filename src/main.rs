//! dashconf - Dashboard Settings Loader
//!
//! Command-line front end for validating, inspecting and rendering the
//! settings document a dashboard host loads at startup.

use clap::Parser;
use dashconf::cli::Cli;
use dashconf::config::Preferences;
use dashconf::error::Result;
use dashconf::utils::DisplayUtils;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug);

    let no_color = cli.no_color;

    // Execute the command
    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        let display = DisplayUtils::new(no_color);
        if e.is_validation_error() {
            display.print_error(&format!("Invalid settings: {}", e));
        } else {
            display.print_error(&e.to_string());
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    debug!("Starting dashconf");

    let preferences = Preferences::load()?;

    cli.execute(preferences).await
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "dashconf=debug" } else { "dashconf=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
