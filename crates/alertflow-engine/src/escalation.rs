//! Periodic escalation evaluator.
//!
//! For every active alert, every active escalation rule on its type is
//! eligible once the alert has existed at least `delay_minutes` and the
//! rule's condition holds. There is no one-shot guard: a rule
//! keeps firing on subsequent ticks while its condition stays true.

use crate::condition::evaluate_condition;
use crate::registry::RuleRegistry;
use crate::store::AlertStore;
use alertflow_common::types::{EscalationAction, EscalationEffect};
use chrono::{DateTime, Utc};

pub(crate) fn run(
    store: &mut AlertStore,
    registry: &RuleRegistry,
    now: DateTime<Utc>,
) -> Vec<EscalationEffect> {
    let mut effects = Vec::new();

    for id in store.active_ids() {
        // A deactivated type takes its rules with it
        let Some(alert_type) = store
            .get(&id)
            .and_then(|a| registry.get_alert_type(&a.alert_type))
            .filter(|t| t.active)
            .cloned()
        else {
            continue;
        };

        for rule in alert_type.escalation_rules.iter().filter(|r| r.active) {
            // Re-fetch per rule: an earlier rule in the same tick may have
            // changed the severity this rule's condition looks at.
            let Some(alert) = store.get(&id).cloned() else {
                break;
            };

            let age_minutes = (now - alert.created_at).num_seconds() as f64 / 60.0;
            if age_minutes < rule.delay_minutes as f64 {
                continue;
            }
            if !evaluate_condition(&alert, &rule.condition, now) {
                continue;
            }

            match &rule.action {
                EscalationAction::IncreaseSeverity { to } => {
                    let result = store.update_with(&id, |a| {
                        a.severity = *to;
                        a.escalation_level += 1;
                        a.updated_at = now;
                    });
                    match result {
                        Ok(updated) => tracing::info!(
                            alert_id = %id,
                            severity = %updated.severity,
                            escalation_level = updated.escalation_level,
                            "Alert severity escalated"
                        ),
                        Err(e) => tracing::error!(alert_id = %id, error = %e, "Escalation update failed"),
                    }
                }
                action => {
                    if let Err(e) = store.update_with(&id, |a| a.updated_at = now) {
                        tracing::error!(alert_id = %id, error = %e, "Escalation touch failed");
                        continue;
                    }
                    tracing::info!(
                        alert_id = %id,
                        action = action.kind(),
                        "Escalation side effect queued"
                    );
                    effects.push(EscalationEffect {
                        alert_id: id.clone(),
                        action: action.clone(),
                    });
                }
            }
        }
    }

    effects
}
