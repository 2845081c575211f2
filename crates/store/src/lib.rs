#![deny(unused)]
//! Conversation memory for AgentRelay.
//!
//! One durable, session-addressable log of request/response turns per agent.
//! Every backend composes this store instead of reimplementing its own.

pub mod conversation;

pub use conversation::{ConversationRecord, ConversationStore, MemoryStats};
