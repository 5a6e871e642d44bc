use crate::{EscalationSink, NotificationDelivery};
use alertflow_common::types::{EscalationEffect, NotificationIntent};
use anyhow::Result;
use async_trait::async_trait;

/// Default collaborator that logs intents and effects instead of
/// delivering them. Used in tests and as the no-op deployment default
/// when no real transport integration is wired up.
pub struct LogDelivery;

#[async_trait]
impl NotificationDelivery for LogDelivery {
    async fn deliver(&self, intent: &NotificationIntent) -> Result<()> {
        let channels: Vec<String> = intent.channels.iter().map(|c| c.to_string()).collect();
        tracing::info!(
            alert_id = %intent.alert_id,
            severity = %intent.severity,
            channels = %channels.join(","),
            title = %intent.title,
            "Would deliver notification"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

#[async_trait]
impl EscalationSink for LogDelivery {
    async fn execute(&self, effect: &EscalationEffect) -> Result<()> {
        tracing::info!(
            alert_id = %effect.alert_id,
            action = effect.action.kind(),
            "Would execute escalation effect"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
