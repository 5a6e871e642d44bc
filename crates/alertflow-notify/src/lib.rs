//! Notification boundary for the alert engine.
//!
//! The engine never talks to a transport directly: it schedules
//! [`NotificationIntent`]s through the [`dispatch::NotificationDispatcher`]
//! and hands escalation side effects to an [`EscalationSink`]. Both
//! collaborators are best-effort; the engine consumes no return value
//! beyond logging failures.

pub mod dispatch;
pub mod error;
pub mod log;

#[cfg(test)]
mod tests;

use alertflow_common::types::{EscalationEffect, NotificationIntent};
use anyhow::Result;
use async_trait::async_trait;

/// An outbound notification delivery collaborator (push/SMS/email/webhook
/// transports live behind this seam, outside the engine).
///
/// # Errors
///
/// Returns an error if delivery fails; the dispatcher logs the failure
/// and moves on. There is no retry.
#[async_trait]
pub trait NotificationDelivery: Send + Sync {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<()>;

    /// Returns the collaborator name used in logs (e.g., `"log"`, `"gateway"`).
    fn name(&self) -> &str;
}

/// Executor for escalation side effects that do not mutate the alert
/// (manager notification, ticket creation, email/SMS, webhook).
#[async_trait]
pub trait EscalationSink: Send + Sync {
    async fn execute(&self, effect: &EscalationEffect) -> Result<()>;

    fn name(&self) -> &str;
}
