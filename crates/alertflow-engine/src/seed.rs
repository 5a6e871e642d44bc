//! Built-in alert type definitions registered at engine construction.

use alertflow_common::types::{
    AlertType, ChannelKind, Condition, ConditionOp, EscalationAction, EscalationRule,
    NotificationRule, Severity,
};
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeSet;

fn channels(kinds: &[ChannelKind]) -> BTreeSet<ChannelKind> {
    kinds.iter().copied().collect()
}

/// Default alert type definitions for first-time startup.
pub fn default_alert_types() -> Vec<AlertType> {
    let now = Utc::now();

    vec![
        AlertType {
            id: "DEVICE_OFFLINE".to_string(),
            name: "Device offline".to_string(),
            category: "device".to_string(),
            default_severity: Severity::High,
            default_priority: 80,
            auto_resolve: true,
            auto_resolve_timeout_minutes: Some(60),
            escalation_rules: vec![EscalationRule {
                condition: Condition {
                    field: "duration".to_string(),
                    operator: ConditionOp::GreaterThan,
                    value: json!(30),
                },
                action: EscalationAction::IncreaseSeverity {
                    to: Severity::Critical,
                },
                delay_minutes: 30,
                active: true,
            }],
            notification_rules: vec![NotificationRule {
                condition: Condition {
                    field: "severity".to_string(),
                    operator: ConditionOp::In,
                    value: json!(["high", "critical"]),
                },
                channels: channels(&[ChannelKind::Push, ChannelKind::Email]),
                delay_minutes: 0,
                active: true,
            }],
            active: true,
            created_at: now,
            updated_at: now,
        },
        AlertType {
            id: "DEVICE_BATTERY_LOW".to_string(),
            name: "Device battery low".to_string(),
            category: "device".to_string(),
            default_severity: Severity::Medium,
            default_priority: 40,
            auto_resolve: true,
            auto_resolve_timeout_minutes: Some(240),
            escalation_rules: vec![],
            notification_rules: vec![NotificationRule {
                condition: Condition {
                    field: "severity".to_string(),
                    operator: ConditionOp::In,
                    value: json!(["medium", "high", "critical"]),
                },
                channels: channels(&[ChannelKind::Push]),
                delay_minutes: 5,
                active: true,
            }],
            active: true,
            created_at: now,
            updated_at: now,
        },
        AlertType {
            id: "BILLING_FAILURE".to_string(),
            name: "Billing failure".to_string(),
            category: "billing".to_string(),
            default_severity: Severity::High,
            default_priority: 75,
            auto_resolve: false,
            auto_resolve_timeout_minutes: None,
            escalation_rules: vec![EscalationRule {
                condition: Condition {
                    field: "occurrence_count".to_string(),
                    operator: ConditionOp::GreaterThan,
                    value: json!(3),
                },
                action: EscalationAction::CreateTicket {
                    params: json!({ "queue": "billing-ops" }),
                },
                delay_minutes: 60,
                active: true,
            }],
            notification_rules: vec![NotificationRule {
                condition: Condition {
                    field: "category".to_string(),
                    operator: ConditionOp::Equals,
                    value: json!("billing"),
                },
                channels: channels(&[ChannelKind::Email]),
                delay_minutes: 0,
                active: true,
            }],
            active: true,
            created_at: now,
            updated_at: now,
        },
        AlertType {
            id: "SECURITY_INTRUSION".to_string(),
            name: "Security intrusion detected".to_string(),
            category: "security".to_string(),
            default_severity: Severity::Critical,
            default_priority: 95,
            auto_resolve: false,
            auto_resolve_timeout_minutes: None,
            escalation_rules: vec![EscalationRule {
                condition: Condition {
                    field: "severity".to_string(),
                    operator: ConditionOp::Equals,
                    value: json!("critical"),
                },
                action: EscalationAction::NotifyManager {
                    params: json!({ "team": "security" }),
                },
                delay_minutes: 15,
                active: true,
            }],
            notification_rules: vec![NotificationRule {
                condition: Condition {
                    field: "priority".to_string(),
                    operator: ConditionOp::GreaterThan,
                    value: json!(90),
                },
                channels: channels(&[ChannelKind::Push, ChannelKind::Sms, ChannelKind::Email]),
                delay_minutes: 0,
                active: true,
            }],
            active: true,
            created_at: now,
            updated_at: now,
        },
    ]
}
