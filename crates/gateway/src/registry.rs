//! Static agent registry.
//!
//! Built once at startup from configuration and shared read-only behind an
//! `Arc`; every request-handling path reads it without locking. Lookups for
//! registered keys never fail, and unknown model aliases are not errors;
//! they fall through to content classification.

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use relay_core::config::AppConfig;
use relay_core::{Error, Result};

/// One registered backend agent.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDescriptor {
    pub key: String,
    pub base_url: String,
    pub display_name: String,
    pub capability: String,
}

/// Immutable registry of agents and model aliases.
pub struct AgentRegistry {
    agents: Vec<AgentDescriptor>,
    by_key: HashMap<String, usize>,
    aliases: Vec<(String, String)>,
    alias_index: HashMap<String, String>,
}

impl AgentRegistry {
    /// Build the registry from configuration, validating addresses,
    /// key uniqueness, and alias targets.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let mut agents = Vec::with_capacity(config.agents.len());
        let mut by_key = HashMap::new();

        for agent in &config.agents {
            Url::parse(&agent.base_url).map_err(|e| {
                Error::internal(format!(
                    "agent '{}' has invalid base_url '{}': {}",
                    agent.key, agent.base_url, e
                ))
            })?;
            if by_key
                .insert(agent.key.clone(), agents.len())
                .is_some()
            {
                return Err(Error::internal(format!(
                    "duplicate agent key '{}'",
                    agent.key
                )));
            }
            agents.push(AgentDescriptor {
                key: agent.key.clone(),
                base_url: agent.base_url.trim_end_matches('/').to_string(),
                display_name: agent.display_name.clone(),
                capability: agent.capability.clone(),
            });
        }

        let mut aliases = Vec::with_capacity(config.model_aliases.len());
        let mut alias_index = HashMap::new();
        for alias in &config.model_aliases {
            if !by_key.contains_key(&alias.agent) {
                return Err(Error::internal(format!(
                    "model alias '{}' targets unknown agent '{}'",
                    alias.model, alias.agent
                )));
            }
            aliases.push((alias.model.clone(), alias.agent.clone()));
            alias_index.insert(alias.model.clone(), alias.agent.clone());
        }

        Ok(Self {
            agents,
            by_key,
            aliases,
            alias_index,
        })
    }

    /// Resolve an agent by key.
    pub fn get(&self, key: &str) -> Option<&AgentDescriptor> {
        self.by_key.get(key).map(|&i| &self.agents[i])
    }

    /// All agents in registration order.
    pub fn agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    /// All model aliases in registration order.
    pub fn aliases(&self) -> &[(String, String)] {
        &self.aliases
    }

    /// The agent key a model name aliases, if any.
    pub fn alias_target(&self, model: &str) -> Option<&str> {
        self.alias_index.get(model).map(String::as_str)
    }

    /// First registered agent carrying a capability tag.
    pub fn by_capability(&self, capability: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.capability == capability)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::config::{AgentConfig, ModelAlias};

    fn registry() -> AgentRegistry {
        AgentRegistry::from_config(&AppConfig::default()).unwrap()
    }

    #[test]
    fn resolves_registered_keys() {
        let reg = registry();
        assert_eq!(reg.len(), 7);
        let agent = reg.get("deployment").unwrap();
        assert_eq!(agent.base_url, "http://127.0.0.1:8007");
        assert_eq!(agent.capability, "infrastructure");
        assert!(reg.get("nope").is_none());
    }

    #[test]
    fn aliases_are_many_to_one() {
        let reg = registry();
        assert_eq!(reg.alias_target("gpt-4"), Some("bengali_nlp"));
        assert_eq!(reg.alias_target("gpt-3.5-turbo"), Some("bengali_nlp"));
        assert_eq!(reg.alias_target("tts-1"), Some("voice_processor"));
        assert_eq!(reg.alias_target("local-model"), None);
    }

    #[test]
    fn finds_voice_agent_by_capability() {
        let reg = registry();
        assert_eq!(reg.by_capability("audio").unwrap().key, "voice_processor");
        assert!(reg.by_capability("quantum").is_none());
    }

    #[test]
    fn preserves_registration_order() {
        let reg = registry();
        let keys: Vec<_> = reg.agents().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys[0], "bengali_nlp");
        assert_eq!(keys[6], "voice_processor");
    }

    #[test]
    fn rejects_bad_configs() {
        let mut cfg = AppConfig::default();
        cfg.agents.push(AgentConfig {
            key: "bengali_nlp".to_string(),
            base_url: "http://127.0.0.1:9000".to_string(),
            display_name: "Duplicate".to_string(),
            capability: "language".to_string(),
        });
        assert!(AgentRegistry::from_config(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.model_aliases.push(ModelAlias {
            model: "ghost".to_string(),
            agent: "missing".to_string(),
        });
        assert!(AgentRegistry::from_config(&cfg).is_err());

        let mut cfg = AppConfig::default();
        cfg.agents[0].base_url = "not a url".to_string();
        assert!(AgentRegistry::from_config(&cfg).is_err());
    }
}
