//! AlumNet Gateway - Main entry point.

use anyhow::Result;
use alumnet_common::config::Config;
use alumnet_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("AlumNet Gateway v{}", env!("CARGO_PKG_VERSION"));

    // Start the gateway server
    alumnet_gateway::start_server(&config).await
}
