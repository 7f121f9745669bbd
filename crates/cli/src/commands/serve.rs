//! `huurwijzer serve` — Start the HTTP API server.

use huurwijzer_config::AppConfig;
use tracing::info;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        backend = %config.backend,
        model = %config.model,
        "Starting huurwijzer gateway"
    );

    huurwijzer_gateway::start(config).await?;

    Ok(())
}
