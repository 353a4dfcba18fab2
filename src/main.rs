use anyhow::Result;
use meddx_rust::{config, server};
use tracing::info;

/// Validates a level or an `EnvFilter` directive list such as
/// `meddx_rust=debug,tower_http=info`. Bare directives must be levels so a
/// misspelt level is not taken for a target name.
fn validate_log_level(level: &str) -> Result<()> {
    for directive in level.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        if !directive.contains('=') && !directive.contains('[') {
            directive
                .parse::<tracing_subscriber::filter::LevelFilter>()
                .map_err(|_| {
                    anyhow::anyhow!(
                        "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                        directive
                    )
                })?;
        }
    }
    tracing_subscriber::EnvFilter::try_new(level)
        .map_err(|e| anyhow::anyhow!("Invalid log filter '{}': {}", level, e))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration comes before logging so the level can be taken from it
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // RUST_LOG overrides the configured level
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let filter = tracing_subscriber::EnvFilter::try_new(&log_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!(
        "Starting MedDx medical analysis server with log level: {}",
        log_level
    );
    info!(
        "Configuration loaded: model={}, chrome={}",
        config.llm.model, config.render.chrome_path
    );

    server::run(config).await?;

    Ok(())
}
