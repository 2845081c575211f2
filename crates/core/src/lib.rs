#![deny(unused)]
//! Core types, configuration, and error definitions for AgentRelay.
//!
//! This crate provides the foundational building blocks shared by the
//! gateway, the conversation store, and the agent runtimes.

pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use types::*;
