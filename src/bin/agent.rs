#![deny(unused)]
//! Standalone backend agent process.
//!
//! Runs one agent from the configured registry with the template responder.
//! Select the agent with `RELAY_AGENT` (default: bengali_nlp); it binds to
//! the port advertised in its configured base_url.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use relay_agent::{AgentServer, TemplateResponder};
use relay_core::AppConfig;
use relay_store::ConversationStore;

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
    let key = std::env::var("RELAY_AGENT").unwrap_or_else(|_| "bengali_nlp".to_string());

    let agent = config
        .agent(&key)
        .ok_or_else(|| anyhow::anyhow!("agent '{}' is not configured", key))?
        .clone();

    let advertised = url::Url::parse(&agent.base_url)?;
    let port = advertised
        .port_or_known_default()
        .ok_or_else(|| anyhow::anyhow!("no port in base_url '{}'", agent.base_url))?;

    let store = Arc::new(ConversationStore::open(
        &agent.key,
        &config.store.data_dir,
        Duration::from_millis(config.store.busy_timeout_ms),
    )?);
    let responder = Arc::new(TemplateResponder::new(agent.display_name.clone()));

    println!(
        "Starting agent '{}' ({}) on port {}",
        agent.key, agent.display_name, port
    );

    AgentServer::new(agent.key, agent.display_name, store, responder)
        .with_bind("0.0.0.0", port)
        .run()
        .await?;

    Ok(())
}
