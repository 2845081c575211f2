//! Downstream dispatch.
//!
//! Forwards a normalized chat-completion (or speech) request to the resolved
//! agent with a bounded timeout and a single attempt, no retries. Transport
//! and HTTP failures map onto the upstream error taxonomy; the gateway never
//! substitutes fabricated content for a failed call.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use relay_core::{ChatCompletionRequest, Error, Result, SpeechRequest};

use crate::registry::{AgentDescriptor, AgentRegistry};

/// Dispatches requests to backend agents.
pub struct Dispatcher {
    client: reqwest::Client,
    registry: Arc<AgentRegistry>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(registry: Arc<AgentRegistry>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry,
            timeout,
        }
    }

    fn agent(&self, key: &str) -> Result<&AgentDescriptor> {
        // Unreachable for keys the classifier produces, unless the registry
        // was configured without the classifier's default targets.
        self.registry
            .get(key)
            .ok_or_else(|| Error::routing(format!("resolved agent '{}' is not registered", key)))
    }

    /// Forward a chat completion to `agent_key` and merge gateway metadata
    /// into the agent's response envelope.
    pub async fn dispatch_chat(
        &self,
        agent_key: &str,
        request: &ChatCompletionRequest,
        session_id: &str,
        bearer_token: &str,
    ) -> Result<Value> {
        let agent = self.agent(agent_key)?;
        let url = format!("{}/v1/chat/completions", agent.base_url);

        tracing::info!(
            agent = %agent.key,
            url = %url,
            session = %session_id,
            model = %request.model,
            "dispatching chat completion"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(bearer_token)
            .header("X-Session-ID", session_id)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(&agent.key, e))?;

        let mut body = self.read_json(&agent.key, response).await?;
        merge_gateway_meta(&mut body, agent);
        Ok(body)
    }

    /// Forward a speech request. Routes exclusively to the audio-capability
    /// agent; the agent's response passes through untouched.
    pub async fn dispatch_speech(&self, request: &SpeechRequest, bearer_token: &str) -> Result<Value> {
        let agent = self
            .registry
            .by_capability("audio")
            .ok_or_else(|| Error::routing("no audio-capability agent registered"))?;
        let url = format!("{}/v1/audio/speech", agent.base_url);

        tracing::info!(agent = %agent.key, url = %url, "dispatching speech request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(bearer_token)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(&agent.key, e))?;

        self.read_json(&agent.key, response).await
    }

    fn transport_error(&self, agent: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::UpstreamTimeout {
                agent: agent.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::UpstreamUnreachable {
                agent: agent.to_string(),
                detail: e.to_string(),
            }
        }
    }

    async fn read_json(&self, agent: &str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(agent, e))?;

        if !status.is_success() {
            tracing::error!(agent = %agent, status = %status, "agent returned error status");
            return Err(Error::UpstreamError {
                agent: agent.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::UpstreamError {
            agent: agent.to_string(),
            status: status.as_u16(),
            body: format!("invalid JSON body: {}", e),
        })
    }
}

/// Merge gateway routing metadata into a response envelope without touching
/// any agent-produced field.
fn merge_gateway_meta(body: &mut Value, agent: &AgentDescriptor) {
    if let Some(obj) = body.as_object_mut() {
        let meta = obj
            .entry("meta")
            .or_insert_with(|| Value::Object(Default::default()));
        if let Some(meta) = meta.as_object_mut() {
            meta.insert("gateway".to_string(), Value::Bool(true));
            meta.insert("routed_to".to_string(), Value::String(agent.key.clone()));
            meta.insert("agent_url".to_string(), Value::String(agent.base_url.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn agent() -> AgentDescriptor {
        AgentDescriptor {
            key: "testing".to_string(),
            base_url: "http://127.0.0.1:8006".to_string(),
            display_name: "Testing".to_string(),
            capability: "coding".to_string(),
        }
    }

    #[test]
    fn merge_adds_gateway_fields_without_clobbering() {
        let mut body = json!({
            "id": "chatcmpl-1",
            "choices": [],
            "meta": {"session_id": "s1", "confidence": 0.95}
        });
        merge_gateway_meta(&mut body, &agent());

        assert_eq!(body["meta"]["session_id"], "s1");
        assert_eq!(body["meta"]["confidence"], 0.95);
        assert_eq!(body["meta"]["gateway"], true);
        assert_eq!(body["meta"]["routed_to"], "testing");
        assert_eq!(body["meta"]["agent_url"], "http://127.0.0.1:8006");
        assert_eq!(body["id"], "chatcmpl-1");
    }

    #[test]
    fn merge_creates_meta_when_absent() {
        let mut body = json!({"id": "chatcmpl-2"});
        merge_gateway_meta(&mut body, &agent());
        assert_eq!(body["meta"]["gateway"], true);
        assert_eq!(body["meta"]["routed_to"], "testing");
    }
}
