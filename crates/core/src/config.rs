//! Application configuration.
//!
//! Built-in defaults carry the full agent and model-alias tables; an optional
//! `relay.toml` and `RELAY_*` environment variables layer on top of them.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dispatch: DispatchConfig,
    pub store: StoreConfig,
    /// Registered agents, in advertised order. Immutable after startup.
    pub agents: Vec<AgentConfig>,
    /// Externally-visible model names mapped to agent keys (many-to-one).
    pub model_aliases: Vec<ModelAlias>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DispatchConfig {
    /// Upper bound for one downstream chat/speech call, in seconds.
    pub timeout_secs: u64,
    /// Upper bound for one liveness probe, in seconds.
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StoreConfig {
    /// Directory holding one `<agent>/memory.db` per agent.
    pub data_dir: String,
    /// Bounded lock-wait for the conversation log. A write that cannot
    /// acquire the database within this window fails and is swallowed
    /// by the caller.
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    pub key: String,
    pub base_url: String,
    pub display_name: String,
    pub capability: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelAlias {
    pub model: String,
    pub agent: String,
}

impl AgentConfig {
    fn new(key: &str, base_url: &str, display_name: &str, capability: &str) -> Self {
        Self {
            key: key.to_string(),
            base_url: base_url.to_string(),
            display_name: display_name.to_string(),
            capability: capability.to_string(),
        }
    }
}

impl ModelAlias {
    fn new(model: &str, agent: &str) -> Self {
        Self {
            model: model.to_string(),
            agent: agent.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8001,
            },
            dispatch: DispatchConfig {
                timeout_secs: 30,
                probe_timeout_secs: 5,
            },
            store: StoreConfig {
                data_dir: "data".to_string(),
                busy_timeout_ms: 5000,
            },
            agents: vec![
                AgentConfig::new("bengali_nlp", "http://127.0.0.1:8002", "Bengali NLP", "language"),
                AgentConfig::new(
                    "code_generation",
                    "http://127.0.0.1:8003",
                    "Code Generation",
                    "coding",
                ),
                AgentConfig::new("code_review", "http://127.0.0.1:8004", "Code Review", "coding"),
                AgentConfig::new(
                    "documentation",
                    "http://127.0.0.1:8005",
                    "Documentation",
                    "writing",
                ),
                AgentConfig::new("testing", "http://127.0.0.1:8006", "Testing", "coding"),
                AgentConfig::new(
                    "deployment",
                    "http://127.0.0.1:8007",
                    "Deployment",
                    "infrastructure",
                ),
                AgentConfig::new(
                    "voice_processor",
                    "http://127.0.0.1:8014",
                    "Voice Processor",
                    "audio",
                ),
            ],
            model_aliases: vec![
                ModelAlias::new("gpt-3.5-turbo", "bengali_nlp"),
                ModelAlias::new("gpt-4", "bengali_nlp"),
                ModelAlias::new("gpt-4-turbo", "bengali_nlp"),
                ModelAlias::new("codex", "code_generation"),
                ModelAlias::new("davinci-codex", "code_generation"),
                ModelAlias::new("claude-instant", "documentation"),
                ModelAlias::new("claude", "documentation"),
                ModelAlias::new("tts-1", "voice_processor"),
                ModelAlias::new("whisper-1", "voice_processor"),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `RELAY_*` environment overrides (e.g. `RELAY_SERVER__PORT=9000`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(Environment::with_prefix("RELAY").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Look up one agent's configuration by key.
    pub fn agent(&self, key: &str) -> Option<&AgentConfig> {
        self.agents.iter().find(|a| a.key == key)
    }
}
