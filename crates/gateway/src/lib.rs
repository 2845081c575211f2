#![deny(unused)]
//! Gateway for AgentRelay.
//!
//! This crate provides the OpenAI-compatible HTTP entry point: the static
//! agent registry, the deterministic request classifier, bounded-timeout
//! dispatch to backend agents, and concurrent health aggregation.

pub mod classifier;
pub mod dispatch;
pub mod health;
pub mod registry;
pub mod server;

pub use classifier::Classifier;
pub use dispatch::Dispatcher;
pub use health::HealthAggregator;
pub use registry::{AgentDescriptor, AgentRegistry};
pub use server::{GatewayConfig, GatewayServer};
