use clap::Parser;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wellness_assessment::{
    analysis::GeminiClient,
    config::{Config, LogFormat},
    server::{self, AppState},
    storage::SqliteStorage,
};

/// Wellness assessment HTTP service
#[derive(Debug, Parser)]
#[command(name = "wellness-assessment", version, about)]
struct Cli {
    /// Override the bind host (HOST)
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port (PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // Initialize logging
    init_logging(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Wellness assessment service starting..."
    );

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    // Initialize analysis client
    let gemini = match GeminiClient::new(&config.analysis, config.request.clone()) {
        Ok(c) => {
            info!(
                base_url = %config.analysis.base_url,
                model = %config.analysis.model,
                "Analysis client initialized"
            );
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize analysis client");
            return Err(e.into());
        }
    };

    let state = Arc::new(AppState::new(config, Arc::new(storage), Arc::new(gemini)));

    if let Err(e) = server::serve(state).await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
