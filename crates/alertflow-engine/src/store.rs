use crate::error::{EngineError, Result};
use alertflow_common::types::{Alert, AlertFilter, AlertStatus};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Counts of alerts per lifecycle status, recomputed from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: u64,
    pub active: u64,
    pub acknowledged: u64,
    pub resolved: u64,
    pub suppressed: u64,
    pub expired: u64,
}

/// Authoritative in-process collection of alerts and their lifecycle.
///
/// Alerts are never physically deleted; terminal states are retained for
/// statistics and audit. Status transitions follow the fixed state
/// machine: anything out of `resolved` or `expired` is rejected with
/// [`EngineError::InvalidState`].
#[derive(Default)]
pub struct AlertStore {
    alerts: HashMap<String, Alert>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alert: Alert) {
        self.alerts.insert(alert.id.clone(), alert);
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.get(id)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// IDs of all currently active alerts. Collected up front so the
    /// periodic evaluators can mutate while iterating.
    pub fn active_ids(&self) -> Vec<String> {
        self.alerts
            .values()
            .filter(|a| a.status == AlertStatus::Active)
            .map(|a| a.id.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.values()
    }

    /// `active → acknowledged`.
    pub fn acknowledge(&mut self, id: &str, actor: &str, now: DateTime<Utc>) -> Result<Alert> {
        let alert = self.alerts.get_mut(id).ok_or_else(|| EngineError::NotFound {
            entity: "alert",
            id: id.to_string(),
        })?;
        if alert.status != AlertStatus::Active {
            return Err(EngineError::InvalidState {
                id: id.to_string(),
                status: alert.status,
                op: "acknowledge",
            });
        }
        alert.status = AlertStatus::Acknowledged;
        alert.acknowledged_at = Some(now);
        alert.acknowledged_by = Some(actor.to_string());
        alert.updated_at = now;
        Ok(alert.clone())
    }

    /// `active → resolved` or `acknowledged → resolved`.
    pub fn resolve(
        &mut self,
        id: &str,
        resolution: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Alert> {
        let alert = self.alerts.get_mut(id).ok_or_else(|| EngineError::NotFound {
            entity: "alert",
            id: id.to_string(),
        })?;
        if !matches!(
            alert.status,
            AlertStatus::Active | AlertStatus::Acknowledged
        ) {
            return Err(EngineError::InvalidState {
                id: id.to_string(),
                status: alert.status,
                op: "resolve",
            });
        }
        alert.status = AlertStatus::Resolved;
        alert.resolved_at = Some(now);
        alert.resolved_by = Some(actor.to_string());
        alert.resolution = Some(resolution.to_string());
        alert.updated_at = now;
        Ok(alert.clone())
    }

    /// `active → expired`. Used by the expiration sweeper when an
    /// alert's explicit deadline has passed.
    pub fn expire(&mut self, id: &str, now: DateTime<Utc>) -> Result<Alert> {
        let alert = self.alerts.get_mut(id).ok_or_else(|| EngineError::NotFound {
            entity: "alert",
            id: id.to_string(),
        })?;
        if alert.status != AlertStatus::Active {
            return Err(EngineError::InvalidState {
                id: id.to_string(),
                status: alert.status,
                op: "expire",
            });
        }
        alert.status = AlertStatus::Expired;
        alert.updated_at = now;
        Ok(alert.clone())
    }

    /// `active → suppressed`. Used by the correlation engine.
    pub fn suppress(&mut self, id: &str, now: DateTime<Utc>) -> Result<Alert> {
        let alert = self.alerts.get_mut(id).ok_or_else(|| EngineError::NotFound {
            entity: "alert",
            id: id.to_string(),
        })?;
        if alert.status != AlertStatus::Active {
            return Err(EngineError::InvalidState {
                id: id.to_string(),
                status: alert.status,
                op: "suppress",
            });
        }
        alert.status = AlertStatus::Suppressed;
        alert.updated_at = now;
        Ok(alert.clone())
    }

    /// Bump the escalation level (monotonically increasing).
    pub fn escalate(&mut self, id: &str, now: DateTime<Utc>) -> Result<Alert> {
        let alert = self.alerts.get_mut(id).ok_or_else(|| EngineError::NotFound {
            entity: "alert",
            id: id.to_string(),
        })?;
        alert.escalation_level += 1;
        alert.updated_at = now;
        Ok(alert.clone())
    }

    /// Apply a closure to an alert. Used by evaluators for mutations that
    /// have no dedicated transition (severity bumps, timestamps).
    pub fn update_with<F>(&mut self, id: &str, f: F) -> Result<Alert>
    where
        F: FnOnce(&mut Alert),
    {
        let alert = self.alerts.get_mut(id).ok_or_else(|| EngineError::NotFound {
            entity: "alert",
            id: id.to_string(),
        })?;
        f(alert);
        Ok(alert.clone())
    }

    /// Find a still-active alert with the same type, user, and device,
    /// created within the dedup window, and merge the new occurrence into
    /// it. Returns the merged alert, or `None` when nothing matched.
    pub fn merge_occurrence(
        &mut self,
        alert_type: &str,
        user_id: Option<&str>,
        device_id: Option<&str>,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let cutoff = now - Duration::minutes(window_minutes);
        let existing = self.alerts.values_mut().find(|a| {
            a.status == AlertStatus::Active
                && a.alert_type == alert_type
                && a.user_id.as_deref() == user_id
                && a.device_id.as_deref() == device_id
                && a.created_at >= cutoff
        })?;
        existing.occurrence_count += 1;
        existing.last_occurrence = now;
        existing.updated_at = now;
        Some(existing.clone())
    }

    /// List alerts matching the filter, newest-first by creation time.
    pub fn query(&self, filter: &AlertFilter) -> Vec<Alert> {
        let mut matched: Vec<&Alert> = self
            .alerts
            .values()
            .filter(|a| {
                filter
                    .user_id
                    .as_deref()
                    .is_none_or(|u| a.user_id.as_deref() == Some(u))
                    && filter
                        .device_id
                        .as_deref()
                        .is_none_or(|d| a.device_id.as_deref() == Some(d))
                    && filter.severity.is_none_or(|s| a.severity == s)
                    && filter.status.is_none_or(|s| a.status == s)
                    && filter
                        .category
                        .as_deref()
                        .is_none_or(|c| a.category == c)
            })
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = filter.offset.unwrap_or(0);
        matched
            .into_iter()
            .skip(offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Recompute the per-status counts. Always derived, never cached, so
    /// the five lifecycle counters cannot drift from the store.
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for alert in self.alerts.values() {
            counts.total += 1;
            match alert.status {
                AlertStatus::Active => counts.active += 1,
                AlertStatus::Acknowledged => counts.acknowledged += 1,
                AlertStatus::Resolved => counts.resolved += 1,
                AlertStatus::Suppressed => counts.suppressed += 1,
                AlertStatus::Expired => counts.expired += 1,
            }
        }
        counts
    }
}
