//! Alert lifecycle and rule-evaluation engine.
//!
//! The engine ingests alert events from arbitrary upstream sources,
//! deduplicates and suppresses them, schedules multi-channel notification
//! intents, escalates alerts that remain unresolved, and groups related
//! alerts via time-windowed correlation. All mutable state lives behind a
//! single [`service::AlertService`]; a periodic
//! [`scheduler::EvaluationScheduler`] drives the background evaluators.
//!
//! Outbound effects (notification delivery, ticket creation, webhooks) are
//! handed off to the collaborator traits in `alertflow-notify` and never
//! awaited by the engine.

pub mod condition;
pub mod config;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod seed;
pub mod service;
pub mod stats;
pub mod store;

mod correlation;
mod escalation;
mod expiration;


pub use error::{EngineError, Result};
pub use service::AlertService;
