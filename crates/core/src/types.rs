//! Wire types shared by the gateway and the agent runtimes.
//!
//! These mirror the OpenAI chat/audio API surface: requests are accepted
//! with the same field names and defaults, and responses are produced as
//! the same completion envelope every downstream agent returns.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_top_p() -> f32 {
    1.0
}

/// OpenAI-compatible chat completions request body.
///
/// Generation parameters are carried through to the routed agent unmodified;
/// the gateway never interprets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default)]
    pub frequency_penalty: f32,
    #[serde(default)]
    pub presence_penalty: f32,
}

impl ChatCompletionRequest {
    /// All `role == "user"` message contents, concatenated in order.
    /// This is the classifier's content input.
    pub fn user_text(&self) -> String {
        self.messages
            .iter()
            .filter(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The first user message, if any.
    pub fn first_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_speech_format() -> String {
    "mp3".to_string()
}

fn default_speed() -> f32 {
    1.0
}

/// OpenAI-compatible audio speech request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    #[serde(default = "default_tts_model")]
    pub model: String,
    pub input: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speech_format")]
    pub response_format: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

/// One choice in a completion envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: String,
}

/// Token accounting. Approximated by whitespace word counts, as the
/// backends have no real tokenizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

impl CompletionUsage {
    pub fn from_texts(prompt: &str, completion: &str) -> Self {
        let prompt_tokens = prompt.split_whitespace().count();
        let completion_tokens = completion.split_whitespace().count();
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Agent-side metadata attached to every completion. The gateway later
/// merges its own routing fields (`gateway`, `routed_to`, `agent_url`)
/// into this section without touching the agent-produced ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionMeta {
    pub memory_used: bool,
    pub processing_time: String,
    pub confidence: f32,
    pub session_id: String,
}

/// OpenAI-style chat completion envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEnvelope {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<CompletionChoice>,
    pub usage: CompletionUsage,
    pub meta: CompletionMeta,
}

impl CompletionEnvelope {
    /// Build a single-choice assistant completion.
    pub fn assistant(
        model: impl Into<String>,
        prompt: &str,
        content: impl Into<String>,
        meta: CompletionMeta,
    ) -> Self {
        let content = content.into();
        let usage = CompletionUsage::from_texts(prompt, &content);
        Self {
            id: format!("chatcmpl-{}", Uuid::new_v4()),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.into(),
            choices: vec![CompletionChoice {
                index: 0,
                message: ChatMessage::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage,
            meta,
        }
    }
}

/// Liveness of a single agent as observed by the health aggregator.
/// Rebuilt on every health query; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    Unreachable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_text_concatenates_user_messages_in_order() {
        let req = ChatCompletionRequest {
            model: "local-model".to_string(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "be brief".to_string(),
                },
                ChatMessage::user("hello"),
                ChatMessage::assistant("hi"),
                ChatMessage::user("world"),
            ],
            stream: false,
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };
        assert_eq!(req.user_text(), "hello world");
        assert_eq!(req.first_user_message(), Some("hello"));
    }

    #[test]
    fn request_defaults_match_api_surface() {
        let req: ChatCompletionRequest = serde_json::from_value(serde_json::json!({
            "model": "gpt-4",
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();
        assert!(!req.stream);
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.max_tokens, 1000);
        assert_eq!(req.top_p, 1.0);
        assert_eq!(req.frequency_penalty, 0.0);
        assert_eq!(req.presence_penalty, 0.0);

        let speech: SpeechRequest =
            serde_json::from_value(serde_json::json!({"input": "hello"})).unwrap();
        assert_eq!(speech.model, "tts-1");
        assert_eq!(speech.voice, "alloy");
        assert_eq!(speech.response_format, "mp3");
        assert_eq!(speech.speed, 1.0);
    }

    #[test]
    fn envelope_counts_usage_by_words() {
        let meta = CompletionMeta {
            memory_used: true,
            processing_time: "0.01s".to_string(),
            confidence: 0.95,
            session_id: "s1".to_string(),
        };
        let env = CompletionEnvelope::assistant("m", "one two three", "four five", meta);
        assert!(env.id.starts_with("chatcmpl-"));
        assert_eq!(env.object, "chat.completion");
        assert_eq!(env.usage.prompt_tokens, 3);
        assert_eq!(env.usage.completion_tokens, 2);
        assert_eq!(env.usage.total_tokens, 5);
        assert_eq!(env.choices[0].message.role, "assistant");
        assert_eq!(env.choices[0].finish_reason, "stop");
    }

    #[test]
    fn health_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HealthState::Unreachable).unwrap(),
            "\"unreachable\""
        );
    }
}
