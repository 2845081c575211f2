#![deny(unused)]
//! AgentRelay - OpenAI-compatible gateway over specialized backend agents.

use std::path::Path;
use std::sync::Arc;

use relay_core::AppConfig;
use relay_gateway::{AgentRegistry, GatewayConfig, GatewayServer};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load(Some(Path::new("relay.toml")))?;
    let registry = Arc::new(AgentRegistry::from_config(&config)?);

    tracing::info!(
        agents = registry.len(),
        models = registry.aliases().len(),
        "registry loaded"
    );

    let gateway_config = GatewayConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        enable_cors: true,
        enable_tracing: true,
    };

    println!("Starting AgentRelay gateway v{}", env!("CARGO_PKG_VERSION"));
    println!("  Agents:  {}", registry.len());
    println!("  Models:  {}", registry.aliases().len());
    println!(
        "  API:     http://{}:{}/v1",
        gateway_config.host, gateway_config.port
    );
    println!(
        "  Health:  http://{}:{}/health",
        gateway_config.host, gateway_config.port
    );

    let server = GatewayServer::new(gateway_config, registry, &config.dispatch);
    server.run().await?;

    Ok(())
}
