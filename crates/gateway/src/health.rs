//! Concurrent health aggregation.
//!
//! One liveness probe per registered agent, all launched together and each
//! bounded by its own short timeout, so total wall clock stays near one
//! probe interval no matter how many agents never respond.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use relay_core::HealthState;

use crate::registry::{AgentDescriptor, AgentRegistry};

/// Probes every registered agent's `/health` endpoint.
pub struct HealthAggregator {
    client: reqwest::Client,
    registry: Arc<AgentRegistry>,
    probe_timeout: Duration,
}

impl HealthAggregator {
    pub fn new(registry: Arc<AgentRegistry>, probe_timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry,
            probe_timeout,
        }
    }

    /// Probe all agents concurrently. A slow or unreachable agent only
    /// affects its own entry.
    pub async fn check_all(&self) -> BTreeMap<String, HealthState> {
        let probes = self.registry.agents().iter().map(|agent| async {
            let state = self.probe(agent).await;
            (agent.key.clone(), state)
        });

        join_all(probes).await.into_iter().collect()
    }

    async fn probe(&self, agent: &AgentDescriptor) -> HealthState {
        let url = format!("{}/health", agent.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => HealthState::Healthy,
            Ok(response) => {
                tracing::warn!(agent = %agent.key, status = %response.status(), "agent unhealthy");
                HealthState::Unhealthy
            }
            Err(e) => {
                tracing::warn!(agent = %agent.key, error = %e, "agent unreachable");
                HealthState::Unreachable
            }
        }
    }
}
