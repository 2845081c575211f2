#![deny(unused)]
//! Backend agent runtime for AgentRelay.
//!
//! Hosts one specialized agent behind the downstream HTTP contract the
//! gateway dispatches to. Generation logic stays behind the [`Responder`]
//! trait; conversation history is recorded through the shared store.

pub mod responder;
pub mod server;

pub use responder::{Responder, TemplateResponder};
pub use server::{AgentServer, AgentState};
