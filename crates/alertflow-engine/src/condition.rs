//! Pure condition evaluation.
//!
//! Every rule type (escalation, notification, suppression, correlation)
//! bottoms out in [`evaluate`]. Evaluation never panics and never returns
//! an error: a malformed condition simply does not match, so a single bad
//! rule cannot halt the evaluation loop.

use alertflow_common::types::{Alert, Condition, ConditionOp};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Evaluate a single (field value, operator, condition value) triple.
///
/// # Examples
///
/// ```
/// use alertflow_common::types::ConditionOp;
/// use alertflow_engine::condition::evaluate;
/// use serde_json::json;
///
/// assert!(evaluate(&json!("high"), &ConditionOp::Equals, &json!("high")));
/// assert!(evaluate(&json!(80), &ConditionOp::GreaterThan, &json!(50)));
/// assert!(!evaluate(&json!("high"), &ConditionOp::GreaterThan, &json!(50)));
/// ```
pub fn evaluate(field_value: &Value, operator: &ConditionOp, expected: &Value) -> bool {
    match operator {
        ConditionOp::Equals => field_value == expected,
        ConditionOp::Contains => match (coerce_string(field_value), expected.as_str()) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        },
        ConditionOp::MatchesRegex => {
            let (Some(haystack), Some(pattern)) = (coerce_string(field_value), expected.as_str())
            else {
                return false;
            };
            match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(&haystack),
                // Invalid pattern: the rule does not fire
                Err(_) => false,
            }
        }
        ConditionOp::In => match expected.as_array() {
            Some(items) => items.iter().any(|item| item == field_value),
            None => false,
        },
        ConditionOp::GreaterThan => match (coerce_f64(field_value), coerce_f64(expected)) {
            (Some(lhs), Some(rhs)) => lhs > rhs,
            _ => false,
        },
        ConditionOp::LessThan => match (coerce_f64(field_value), coerce_f64(expected)) {
            (Some(lhs), Some(rhs)) => lhs < rhs,
            _ => false,
        },
        // The caller substitutes minutes-since-creation as the field value.
        ConditionOp::NotResolvedFor => match (coerce_f64(field_value), coerce_f64(expected)) {
            (Some(age_minutes), Some(threshold)) => age_minutes >= threshold,
            _ => false,
        },
        ConditionOp::Unknown => false,
    }
}

/// Evaluate a [`Condition`] against an alert's attributes.
///
/// `not_resolved_for` ignores the condition's field and compares minutes
/// since the alert's creation against the condition value.
pub fn evaluate_condition(alert: &Alert, condition: &Condition, now: DateTime<Utc>) -> bool {
    let field_value = if condition.operator == ConditionOp::NotResolvedFor {
        Value::from(age_minutes(alert, now))
    } else {
        alert_field(alert, &condition.field, now)
    };
    evaluate(&field_value, &condition.operator, &condition.value)
}

/// Resolve a condition field name to the alert's attribute value.
/// Unknown fields resolve to null, which no operator matches.
pub fn alert_field(alert: &Alert, field: &str, now: DateTime<Utc>) -> Value {
    match field {
        "severity" => Value::from(alert.severity.to_string()),
        "priority" => Value::from(alert.priority),
        "occurrence_count" => Value::from(alert.occurrence_count),
        "duration" => Value::from(age_minutes(alert, now)),
        "source" => Value::from(alert.source.clone()),
        "type" => Value::from(alert.alert_type.clone()),
        "category" => Value::from(alert.category.clone()),
        "title" => Value::from(alert.title.clone()),
        _ => Value::Null,
    }
}

fn age_minutes(alert: &Alert, now: DateTime<Utc>) -> f64 {
    (now - alert.created_at).num_seconds() as f64 / 60.0
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}
