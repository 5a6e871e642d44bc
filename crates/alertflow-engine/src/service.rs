use crate::condition::evaluate_condition;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::registry::RuleRegistry;
use crate::stats::StatsCounters;
use crate::store::AlertStore;
use crate::{correlation, escalation, expiration, seed};
use alertflow_common::id::IdSource;
use alertflow_common::types::{
    Alert, AlertFilter, AlertStats, AlertStatus, AlertType, Condition, CorrelationAction,
    CorrelationRule, CreateAlertRequest, NotificationIntent, Severity, SuppressionRule,
};
use alertflow_notify::dispatch::{render_intent, NotificationDispatcher};
use alertflow_notify::{EscalationSink, NotificationDelivery};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Single owner of all mutable engine state.
///
/// Caller operations and the background tick both go through the one
/// mutex, so the state machine invariants hold without per-alert locking.
struct EngineInner {
    store: AlertStore,
    registry: RuleRegistry,
    stats: StatsCounters,
    ids: IdSource,
    /// Alert ids awaiting notification-rule evaluation, flushed each tick.
    pending_notifications: VecDeque<String>,
}

/// The alert lifecycle engine facade.
///
/// Explicitly constructed and dependency-injected: callers hand in the
/// delivery and escalation collaborators, and own the service's lifetime
/// (typically wrapped in an `Arc` shared with the
/// [`crate::scheduler::EvaluationScheduler`]).
pub struct AlertService {
    inner: Mutex<EngineInner>,
    dispatcher: NotificationDispatcher,
    config: EngineConfig,
}

impl AlertService {
    pub fn new(
        config: EngineConfig,
        delivery: Arc<dyn NotificationDelivery>,
        sink: Arc<dyn EscalationSink>,
    ) -> Self {
        let mut registry =
            RuleRegistry::with_id_source(IdSource::new(config.machine_id, config.node_id));
        if config.seed_builtin_types {
            for def in seed::default_alert_types() {
                if let Err(e) = registry.create_alert_type(def) {
                    tracing::error!(error = %e, "Failed to register built-in alert type");
                }
            }
        }

        Self {
            inner: Mutex::new(EngineInner {
                store: AlertStore::new(),
                registry,
                stats: StatsCounters::new(),
                ids: IdSource::new(config.machine_id, config.node_id),
                pending_notifications: VecDeque::new(),
            }),
            dispatcher: NotificationDispatcher::new(delivery, sink),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ── Caller API ──

    /// Ingest an alert event: suppression check, then dedup merge, then
    /// insertion and notification enqueue.
    ///
    /// A dedup hit returns the merged existing alert with its occurrence
    /// count bumped; no new alert is stored and no notification
    /// re-evaluation happens for the merged event.
    pub fn create_alert(&self, req: CreateAlertRequest) -> Result<Alert> {
        validate_request(&req)?;
        let now = Utc::now();
        let mut inner = self.lock();

        let type_def = inner.registry.get_alert_type(&req.alert_type).cloned();
        let type_def = type_def.filter(|t| t.active);

        let severity = req
            .severity
            .or(type_def.as_ref().map(|t| t.default_severity))
            .unwrap_or(Severity::Medium);
        let priority = req
            .priority
            .or(type_def.as_ref().map(|t| t.default_priority))
            .unwrap_or(self.config.unknown_type_priority);
        let category = req
            .category
            .or(type_def.as_ref().map(|t| t.category.clone()))
            .unwrap_or_else(|| "general".to_string());
        let auto_resolve_timeout = type_def
            .as_ref()
            .filter(|t| t.auto_resolve)
            .and_then(|t| t.auto_resolve_timeout_minutes);

        let mut alert = Alert {
            id: inner.ids.next(),
            source: req.source,
            alert_type: req.alert_type,
            severity,
            title: req.title,
            description: req.description.unwrap_or_default(),
            user_id: req.user_id,
            device_id: req.device_id,
            data: req.data.unwrap_or(serde_json::Value::Null),
            metadata: req.metadata.unwrap_or(serde_json::Value::Null),
            status: AlertStatus::Active,
            priority,
            tags: req.tags,
            category,
            subcategory: req.subcategory,
            created_at: now,
            updated_at: now,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
            resolution: None,
            expires_at: req.expires_at,
            last_occurrence: now,
            occurrence_count: 1,
            escalation_level: 0,
            auto_resolve_timeout,
        };

        // Suppression is decided at ingestion time only. Suppressed alerts
        // are stored and counted but never enter the notification queue.
        let suppressed_by = inner
            .registry
            .effective_suppression_rules(now)
            .find(|r| evaluate_condition(&alert, &r.condition, now))
            .map(|r| r.id.clone());
        if let Some(rule_id) = suppressed_by {
            alert.status = AlertStatus::Suppressed;
            inner.stats.record_created(&alert);
            inner.store.insert(alert.clone());
            tracing::info!(
                alert_id = %alert.id,
                rule_id = %rule_id,
                "Alert suppressed at ingestion"
            );
            return Ok(alert);
        }

        if let Some(merged) = inner.store.merge_occurrence(
            &alert.alert_type,
            alert.user_id.as_deref(),
            alert.device_id.as_deref(),
            self.config.dedup_window_minutes,
            now,
        ) {
            tracing::debug!(
                alert_id = %merged.id,
                occurrences = merged.occurrence_count,
                "Duplicate alert merged into existing occurrence"
            );
            return Ok(merged);
        }

        inner.stats.record_created(&alert);
        inner.store.insert(alert.clone());
        inner.pending_notifications.push_back(alert.id.clone());
        tracing::info!(
            alert_id = %alert.id,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            priority = alert.priority,
            "Alert created"
        );
        Ok(alert)
    }

    /// `active → acknowledged`. Fails with [`EngineError::NotFound`] for an
    /// unknown id and [`EngineError::InvalidState`] for any other status.
    pub fn acknowledge_alert(&self, id: &str, actor: &str) -> Result<Alert> {
        let now = Utc::now();
        let mut inner = self.lock();
        let alert = inner.store.acknowledge(id, actor, now)?;
        let sample = (now - alert.created_at).num_seconds() as f64 / 60.0;
        inner.stats.record_acknowledged(sample);
        tracing::info!(alert_id = %id, actor = %actor, "Alert acknowledged");
        Ok(alert)
    }

    /// `active|acknowledged → resolved`. Updates the rolling resolution
    /// average with the `(old + new) / 2` smoothing.
    pub fn resolve_alert(&self, id: &str, resolution: &str, actor: &str) -> Result<Alert> {
        let now = Utc::now();
        let mut inner = self.lock();
        let alert = inner.store.resolve(id, resolution, actor, now)?;
        let sample = (now - alert.created_at).num_seconds() as f64 / 60.0;
        inner.stats.record_resolved(sample);
        tracing::info!(alert_id = %id, actor = %actor, resolution = %resolution, "Alert resolved");
        Ok(alert)
    }

    pub fn get_alert(&self, id: &str) -> Option<Alert> {
        self.lock().store.get(id).cloned()
    }

    pub fn get_alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.lock().store.query(filter)
    }

    /// Statistics snapshot: status counts recomputed from the store,
    /// breakdowns and rollups from the incremental counters.
    pub fn stats(&self) -> AlertStats {
        let inner = self.lock();
        inner.stats.snapshot(&inner.store, self.config.top_types_limit)
    }

    // ── Rule registry CRUD ──

    pub fn create_alert_type(&self, def: AlertType) -> Result<AlertType> {
        self.lock().registry.create_alert_type(def)
    }

    pub fn update_alert_type(&self, def: AlertType) -> Result<AlertType> {
        self.lock().registry.update_alert_type(def)
    }

    pub fn delete_alert_type(&self, id: &str) -> Result<()> {
        self.lock().registry.delete_alert_type(id)
    }

    pub fn list_alert_types(&self) -> Vec<AlertType> {
        self.lock().registry.list_alert_types()
    }

    pub fn create_suppression_rule(
        &self,
        condition: Condition,
        duration_minutes: i64,
        active: bool,
    ) -> Result<SuppressionRule> {
        self.lock()
            .registry
            .create_suppression_rule(condition, duration_minutes, active)
    }

    pub fn update_suppression_rule(
        &self,
        id: &str,
        condition: Condition,
        duration_minutes: i64,
        active: bool,
    ) -> Result<SuppressionRule> {
        self.lock()
            .registry
            .update_suppression_rule(id, condition, duration_minutes, active)
    }

    pub fn delete_suppression_rule(&self, id: &str) -> Result<()> {
        self.lock().registry.delete_suppression_rule(id)
    }

    pub fn create_correlation_rule(
        &self,
        name: &str,
        conditions: Vec<Condition>,
        time_window_minutes: i64,
        min_alerts: usize,
        action: CorrelationAction,
        active: bool,
    ) -> Result<CorrelationRule> {
        self.lock().registry.create_correlation_rule(
            name,
            conditions,
            time_window_minutes,
            min_alerts,
            action,
            active,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_correlation_rule(
        &self,
        id: &str,
        name: &str,
        conditions: Vec<Condition>,
        time_window_minutes: i64,
        min_alerts: usize,
        action: CorrelationAction,
        active: bool,
    ) -> Result<CorrelationRule> {
        self.lock().registry.update_correlation_rule(
            id,
            name,
            conditions,
            time_window_minutes,
            min_alerts,
            action,
            active,
        )
    }

    pub fn delete_correlation_rule(&self, id: &str) -> Result<()> {
        self.lock().registry.delete_correlation_rule(id)
    }

    // ── Background tick ──

    /// Run one evaluation tick, in order: flush queued notification
    /// evaluations, sweep expirations, evaluate escalations, evaluate
    /// correlations. Each phase isolates its own failures so the tick
    /// never stops partway.
    ///
    /// Must be called from within a tokio runtime (deferred intents are
    /// spawned tasks).
    pub fn run_tick(&self) {
        self.flush_notifications();
        self.sweep_expirations();
        self.evaluate_escalations();
        self.evaluate_correlations();
    }

    fn flush_notifications(&self) {
        let scheduled: Vec<(NotificationIntent, i64)> = {
            let mut inner = self.lock();
            let now = Utc::now();
            let ids: Vec<String> = inner.pending_notifications.drain(..).collect();
            let mut out = Vec::new();
            for id in ids {
                let Some(alert) = inner.store.get(&id) else {
                    continue;
                };
                // A deactivated type takes its rules with it
                let Some(type_def) = inner
                    .registry
                    .get_alert_type(&alert.alert_type)
                    .filter(|t| t.active)
                else {
                    continue;
                };
                for rule in type_def.notification_rules.iter().filter(|r| r.active) {
                    if !evaluate_condition(alert, &rule.condition, now) {
                        continue;
                    }
                    out.push((
                        render_intent(
                            &alert.id,
                            alert.severity,
                            &alert.title,
                            &alert.description,
                            rule.channels.clone(),
                        ),
                        rule.delay_minutes,
                    ));
                }
            }
            out
        };

        // Dispatch outside the lock; intents are fire-and-forget.
        for (intent, delay_minutes) in scheduled {
            if let Err(e) = self.dispatcher.schedule(intent, delay_minutes) {
                tracing::warn!(error = %e, "Notification intent dropped");
            }
        }
    }

    fn sweep_expirations(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        let (resolved, expired) = expiration::run(&mut inner.store, &mut inner.stats, Utc::now());
        if resolved + expired > 0 {
            tracing::debug!(resolved, expired, "Expiration sweep completed");
        }
    }

    fn evaluate_escalations(&self) {
        let effects = {
            let mut guard = self.lock();
            let inner = &mut *guard;
            escalation::run(&mut inner.store, &inner.registry, Utc::now())
        };
        for effect in effects {
            self.dispatcher.execute_effect(effect);
        }
    }

    fn evaluate_correlations(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        correlation::run(&mut inner.store, &inner.registry, Utc::now());
    }
}

fn validate_request(req: &CreateAlertRequest) -> Result<()> {
    if req.source.is_empty() {
        return Err(EngineError::Validation(
            "alert source must not be empty".to_string(),
        ));
    }
    if req.alert_type.is_empty() {
        return Err(EngineError::Validation(
            "alert type must not be empty".to_string(),
        ));
    }
    if req.title.is_empty() {
        return Err(EngineError::Validation(
            "alert title must not be empty".to_string(),
        ));
    }
    if let Some(priority) = req.priority {
        if !(1..=100).contains(&priority) {
            return Err(EngineError::Validation(format!(
                "alert priority must be 1-100, got {priority}"
            )));
        }
    }
    Ok(())
}
