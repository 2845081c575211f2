//! Pluggable response generation.
//!
//! Generation quality is outside this crate's concern: the runtime only
//! needs something that turns a prompt into text. Deployments wire in a
//! model-backed implementation; the template responder keeps an agent
//! process functional without one.

use async_trait::async_trait;

use relay_core::Result;

/// Produces the assistant response for one user input.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, input: &str) -> Result<String>;

    /// Confidence reported in the completion metadata.
    fn confidence(&self) -> f32 {
        0.95
    }
}

/// Canned responder: acknowledges the request in the agent's voice.
pub struct TemplateResponder {
    agent_name: String,
}

impl TemplateResponder {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
        }
    }
}

#[async_trait]
impl Responder for TemplateResponder {
    async fn respond(&self, input: &str) -> Result<String> {
        Ok(format!(
            "{} processed your request.\n\nInput: {}",
            self.agent_name, input
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn template_responder_mentions_agent_and_input() {
        let responder = TemplateResponder::new("Code Review");
        let text = responder.respond("check this diff").await.unwrap();
        assert!(text.contains("Code Review"));
        assert!(text.contains("check this diff"));
        assert_eq!(responder.confidence(), 0.95);
    }
}
