use crate::error::{NotifyError, Result};
use crate::{EscalationSink, NotificationDelivery};
use alertflow_common::types::{EscalationEffect, NotificationIntent};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Schedules notification intents and escalation effects against the
/// external collaborators.
///
/// Delayed intents are independent deferred tasks: once spawned they carry
/// no cancellation token, so an intent still fires if its alert resolves
/// or is suppressed in the meantime.
pub struct NotificationDispatcher {
    delivery: Arc<dyn NotificationDelivery>,
    sink: Arc<dyn EscalationSink>,
}

impl NotificationDispatcher {
    pub fn new(delivery: Arc<dyn NotificationDelivery>, sink: Arc<dyn EscalationSink>) -> Self {
        Self { delivery, sink }
    }

    /// Schedule an intent to fire once `delay_minutes` has elapsed.
    /// Fire-and-forget after scheduling: delivery failures are logged,
    /// never retried.
    pub fn schedule(&self, mut intent: NotificationIntent, delay_minutes: i64) -> Result<()> {
        if intent.channels.is_empty() {
            return Err(NotifyError::EmptyChannelSet {
                alert_id: intent.alert_id,
            });
        }

        let delivery = self.delivery.clone();
        let minutes = delay_minutes.max(0);
        let delay = Duration::from_secs((minutes as u64).saturating_mul(60));
        intent.scheduled_for = chrono::Duration::try_minutes(minutes)
            .and_then(|d| Utc::now().checked_add_signed(d))
            .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);

        tokio::spawn(async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            if let Err(e) = delivery.deliver(&intent).await {
                tracing::error!(
                    collaborator = delivery.name(),
                    alert_id = %intent.alert_id,
                    error = %e,
                    "Failed to deliver notification intent"
                );
            }
        });
        Ok(())
    }

    /// Hand an escalation side effect to the sink without waiting on it.
    pub fn execute_effect(&self, effect: EscalationEffect) {
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.execute(&effect).await {
                tracing::error!(
                    collaborator = sink.name(),
                    alert_id = %effect.alert_id,
                    action = effect.action.kind(),
                    "Failed to execute escalation effect: {e}"
                );
            }
        });
    }
}

/// Build the rendered intent content for an alert. Rendering happens once
/// at scheduling time since transports are external and only receive text.
/// `scheduled_for` is stamped by [`NotificationDispatcher::schedule`].
pub fn render_intent(
    alert_id: &str,
    severity: alertflow_common::types::Severity,
    title: &str,
    description: &str,
    channels: std::collections::BTreeSet<alertflow_common::types::ChannelKind>,
) -> NotificationIntent {
    NotificationIntent {
        alert_id: alert_id.to_string(),
        channels,
        severity,
        title: format!("[{}] {}", severity.to_string().to_uppercase(), title),
        body: if description.is_empty() {
            title.to_string()
        } else {
            description.to_string()
        },
        scheduled_for: Utc::now(),
    }
}
