use crate::error::{EngineError, Result};
use alertflow_common::id::IdSource;
use alertflow_common::types::{
    AlertType, Condition, CorrelationAction, CorrelationRule, SuppressionRule,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Upper bound for rule delays, one week in minutes.
const MAX_RULE_DELAY_MINUTES: i64 = 10_080;

/// Holds the rule definitions read by the evaluators: alert types (with
/// their escalation and notification rules), global suppression rules,
/// and correlation rules.
///
/// Created/updated by configuration calls; read-only during alert
/// processing.
#[derive(Default)]
pub struct RuleRegistry {
    alert_types: HashMap<String, AlertType>,
    suppression_rules: Vec<SuppressionRule>,
    correlation_rules: Vec<CorrelationRule>,
    ids: IdSource,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_source(ids: IdSource) -> Self {
        Self {
            ids,
            ..Self::default()
        }
    }

    // ── Alert types ──

    pub fn get_alert_type(&self, id: &str) -> Option<&AlertType> {
        self.alert_types.get(id)
    }

    pub fn list_alert_types(&self) -> Vec<AlertType> {
        let mut types: Vec<AlertType> = self.alert_types.values().cloned().collect();
        types.sort_by(|a, b| a.id.cmp(&b.id));
        types
    }

    pub fn create_alert_type(&mut self, mut def: AlertType) -> Result<AlertType> {
        validate_alert_type(&def)?;
        if self.alert_types.contains_key(&def.id) {
            return Err(EngineError::Validation(format!(
                "alert type '{}' already exists",
                def.id
            )));
        }
        let now = Utc::now();
        def.created_at = now;
        def.updated_at = now;
        self.alert_types.insert(def.id.clone(), def.clone());
        tracing::info!(type_id = %def.id, "Alert type registered");
        Ok(def)
    }

    pub fn update_alert_type(&mut self, mut def: AlertType) -> Result<AlertType> {
        validate_alert_type(&def)?;
        let existing = self
            .alert_types
            .get(&def.id)
            .ok_or_else(|| EngineError::NotFound {
                entity: "alert type",
                id: def.id.clone(),
            })?;
        def.created_at = existing.created_at;
        def.updated_at = Utc::now();
        self.alert_types.insert(def.id.clone(), def.clone());
        Ok(def)
    }

    pub fn delete_alert_type(&mut self, id: &str) -> Result<()> {
        self.alert_types
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EngineError::NotFound {
                entity: "alert type",
                id: id.to_string(),
            })
    }

    // ── Suppression rules ──

    pub fn create_suppression_rule(
        &mut self,
        condition: Condition,
        duration_minutes: i64,
        active: bool,
    ) -> Result<SuppressionRule> {
        validate_suppression_rule(&condition, duration_minutes)?;
        let rule = SuppressionRule {
            id: self.ids.next(),
            condition,
            duration_minutes,
            active,
            created_at: Utc::now(),
        };
        self.suppression_rules.push(rule.clone());
        Ok(rule)
    }

    /// Replace a suppression rule's fields. `created_at` is preserved, so
    /// an updated rule's duration window still counts from its creation.
    pub fn update_suppression_rule(
        &mut self,
        id: &str,
        condition: Condition,
        duration_minutes: i64,
        active: bool,
    ) -> Result<SuppressionRule> {
        validate_suppression_rule(&condition, duration_minutes)?;
        let rule = self
            .suppression_rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| EngineError::NotFound {
                entity: "suppression rule",
                id: id.to_string(),
            })?;
        rule.condition = condition;
        rule.duration_minutes = duration_minutes;
        rule.active = active;
        Ok(rule.clone())
    }

    pub fn delete_suppression_rule(&mut self, id: &str) -> Result<()> {
        let len_before = self.suppression_rules.len();
        self.suppression_rules.retain(|r| r.id != id);
        if self.suppression_rules.len() == len_before {
            return Err(EngineError::NotFound {
                entity: "suppression rule",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Suppression rules currently in effect: active, and still within
    /// their own duration window (0 = no time bound).
    pub fn effective_suppression_rules(
        &self,
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &SuppressionRule> {
        self.suppression_rules.iter().filter(move |r| {
            r.active
                && (r.duration_minutes == 0
                    || now - r.created_at <= Duration::minutes(r.duration_minutes))
        })
    }

    // ── Correlation rules ──

    pub fn create_correlation_rule(
        &mut self,
        name: &str,
        conditions: Vec<Condition>,
        time_window_minutes: i64,
        min_alerts: usize,
        action: CorrelationAction,
        active: bool,
    ) -> Result<CorrelationRule> {
        validate_correlation_rule(&conditions, time_window_minutes, min_alerts)?;
        let rule = CorrelationRule {
            id: self.ids.next(),
            name: name.to_string(),
            conditions,
            time_window_minutes,
            min_alerts,
            action,
            active,
            created_at: Utc::now(),
        };
        self.correlation_rules.push(rule.clone());
        Ok(rule)
    }

    /// Replace a correlation rule's fields, preserving `created_at`.
    #[allow(clippy::too_many_arguments)]
    pub fn update_correlation_rule(
        &mut self,
        id: &str,
        name: &str,
        conditions: Vec<Condition>,
        time_window_minutes: i64,
        min_alerts: usize,
        action: CorrelationAction,
        active: bool,
    ) -> Result<CorrelationRule> {
        validate_correlation_rule(&conditions, time_window_minutes, min_alerts)?;
        let rule = self
            .correlation_rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| EngineError::NotFound {
                entity: "correlation rule",
                id: id.to_string(),
            })?;
        rule.name = name.to_string();
        rule.conditions = conditions;
        rule.time_window_minutes = time_window_minutes;
        rule.min_alerts = min_alerts;
        rule.action = action;
        rule.active = active;
        Ok(rule.clone())
    }

    pub fn delete_correlation_rule(&mut self, id: &str) -> Result<()> {
        let len_before = self.correlation_rules.len();
        self.correlation_rules.retain(|r| r.id != id);
        if self.correlation_rules.len() == len_before {
            return Err(EngineError::NotFound {
                entity: "correlation rule",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn active_correlation_rules(&self) -> impl Iterator<Item = &CorrelationRule> {
        self.correlation_rules.iter().filter(|r| r.active)
    }
}

fn validate_alert_type(def: &AlertType) -> Result<()> {
    if def.id.is_empty() {
        return Err(EngineError::Validation(
            "alert type id must not be empty".to_string(),
        ));
    }
    if def.name.is_empty() {
        return Err(EngineError::Validation(
            "alert type name must not be empty".to_string(),
        ));
    }
    if !(1..=100).contains(&def.default_priority) {
        return Err(EngineError::Validation(format!(
            "alert type '{}' default priority must be 1-100, got {}",
            def.id, def.default_priority
        )));
    }
    for rule in &def.notification_rules {
        if rule.channels.is_empty() {
            return Err(EngineError::Validation(format!(
                "alert type '{}' has a notification rule with no channels",
                def.id
            )));
        }
        validate_rule_delay(&def.id, rule.delay_minutes)?;
    }
    for rule in &def.escalation_rules {
        validate_rule_delay(&def.id, rule.delay_minutes)?;
    }
    Ok(())
}

fn validate_rule_delay(type_id: &str, delay_minutes: i64) -> Result<()> {
    if !(0..=MAX_RULE_DELAY_MINUTES).contains(&delay_minutes) {
        return Err(EngineError::Validation(format!(
            "alert type '{type_id}' has a rule delay of {delay_minutes} minutes, \
             must be 0-{MAX_RULE_DELAY_MINUTES}"
        )));
    }
    Ok(())
}

fn validate_suppression_rule(condition: &Condition, duration_minutes: i64) -> Result<()> {
    if condition.field.is_empty() {
        return Err(EngineError::Validation(
            "suppression rule condition field must not be empty".to_string(),
        ));
    }
    if duration_minutes < 0 {
        return Err(EngineError::Validation(
            "suppression rule duration must not be negative".to_string(),
        ));
    }
    Ok(())
}

fn validate_correlation_rule(
    conditions: &[Condition],
    time_window_minutes: i64,
    min_alerts: usize,
) -> Result<()> {
    if conditions.is_empty() {
        return Err(EngineError::Validation(
            "correlation rule needs at least one condition".to_string(),
        ));
    }
    if time_window_minutes <= 0 {
        return Err(EngineError::Validation(
            "correlation time window must be positive".to_string(),
        ));
    }
    if min_alerts == 0 {
        return Err(EngineError::Validation(
            "correlation minAlerts must be at least 1".to_string(),
        ));
    }
    Ok(())
}
