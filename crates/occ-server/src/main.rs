//! OCC Server - Main entry point

use anyhow::Result;
use occ_common::logging::{init_logging, LogConfig};
use occ_server::{api, config::Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("occ-server".to_string())
        .filter_directives("occ_server=debug,tower_http=debug,axum=trace".to_string())
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    info!("Starting OCC Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    api::serve(config).await?;

    Ok(())
}
