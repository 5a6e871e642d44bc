//! Periodic correlation engine: counts alerts matching a rule's AND-combined
//! conditions within its time window and executes the rule action when the
//! threshold is met. Rules re-evaluate every tick, so an action can
//! re-trigger on the same alert set while it remains within the window.

use crate::condition::evaluate_condition;
use crate::registry::RuleRegistry;
use crate::store::AlertStore;
use alertflow_common::types::{AlertStatus, CorrelationAction};
use chrono::{DateTime, Duration, Utc};

pub(crate) fn run(store: &mut AlertStore, registry: &RuleRegistry, now: DateTime<Utc>) {
    for rule in registry.active_correlation_rules() {
        let cutoff = now - Duration::minutes(rule.time_window_minutes);
        let matched: Vec<String> = store
            .iter()
            .filter(|a| {
                a.created_at >= cutoff
                    && rule
                        .conditions
                        .iter()
                        .all(|c| evaluate_condition(a, c, now))
            })
            .map(|a| a.id.clone())
            .collect();

        if matched.len() < rule.min_alerts {
            continue;
        }

        match rule.action {
            CorrelationAction::Group => {
                tracing::info!(
                    rule = %rule.name,
                    count = matched.len(),
                    alert_ids = ?matched,
                    "Correlated alert group detected"
                );
            }
            CorrelationAction::Suppress => {
                for id in &matched {
                    // Only active alerts can move to suppressed; terminal
                    // alerts still count toward the threshold.
                    if store.get(id).map(|a| a.status) != Some(AlertStatus::Active) {
                        continue;
                    }
                    match store.suppress(id, now) {
                        Ok(_) => tracing::info!(rule = %rule.name, alert_id = %id, "Alert suppressed by correlation"),
                        Err(e) => tracing::error!(rule = %rule.name, alert_id = %id, error = %e, "Correlation suppress failed"),
                    }
                }
            }
            CorrelationAction::Escalate => {
                for id in &matched {
                    if let Err(e) = store.escalate(id, now) {
                        tracing::error!(rule = %rule.name, alert_id = %id, error = %e, "Correlation escalate failed");
                    }
                }
                tracing::info!(rule = %rule.name, count = matched.len(), "Correlated alerts escalated");
            }
            CorrelationAction::CreateParentAlert => {
                tracing::info!(
                    rule = %rule.name,
                    count = matched.len(),
                    "Would synthesize parent alert for correlated group"
                );
            }
        }
    }
}
