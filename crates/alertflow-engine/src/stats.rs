use crate::store::AlertStore;
use alertflow_common::types::{Alert, AlertStats, TypeFrequency};
use std::collections::HashMap;

/// Incrementally maintained statistics counters.
///
/// The five status counts are NOT kept here: they are recomputed from
/// the store on every query and cannot drift. The
/// breakdowns and rollups below are bumped once at alert creation and are
/// eventually-consistent approximations (an alert whose severity is later
/// escalated stays in its original severity bucket).
#[derive(Debug, Default)]
pub struct StatsCounters {
    by_severity: HashMap<String, u64>,
    by_category: HashMap<String, u64>,
    by_source: HashMap<String, u64>,
    hourly: HashMap<String, u64>,
    daily: HashMap<String, u64>,
    type_counts: HashMap<String, u64>,
    avg_resolution_minutes: f64,
    avg_acknowledgment_minutes: f64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created alert (including suppressed ones).
    pub fn record_created(&mut self, alert: &Alert) {
        *self
            .by_severity
            .entry(alert.severity.to_string())
            .or_insert(0) += 1;
        *self
            .by_category
            .entry(alert.category.clone())
            .or_insert(0) += 1;
        *self.by_source.entry(alert.source.clone()).or_insert(0) += 1;
        *self
            .type_counts
            .entry(alert.alert_type.clone())
            .or_insert(0) += 1;

        let hour_key = alert.created_at.format("%Y-%m-%dT%H").to_string();
        let day_key = alert.created_at.format("%Y-%m-%d").to_string();
        *self.hourly.entry(hour_key).or_insert(0) += 1;
        *self.daily.entry(day_key).or_insert(0) += 1;
    }

    /// Fold an acknowledgment-latency sample (minutes) into the rolling
    /// average. The smoothing is `(old + new) / 2`, not a true mean.
    pub fn record_acknowledged(&mut self, sample_minutes: f64) {
        self.avg_acknowledgment_minutes =
            (self.avg_acknowledgment_minutes + sample_minutes) / 2.0;
    }

    /// Fold a resolution-latency sample (minutes) into the rolling average.
    pub fn record_resolved(&mut self, sample_minutes: f64) {
        self.avg_resolution_minutes = (self.avg_resolution_minutes + sample_minutes) / 2.0;
    }

    /// Build a statistics snapshot: status counts recomputed from the
    /// store, everything else copied from the incremental counters.
    pub fn snapshot(&self, store: &AlertStore, top_types_limit: usize) -> AlertStats {
        let counts = store.status_counts();

        let mut top_types: Vec<TypeFrequency> = self
            .type_counts
            .iter()
            .map(|(alert_type, count)| TypeFrequency {
                alert_type: alert_type.clone(),
                count: *count,
            })
            .collect();
        top_types.sort_by(|a, b| b.count.cmp(&a.count).then(a.alert_type.cmp(&b.alert_type)));
        top_types.truncate(top_types_limit);

        AlertStats {
            total_alerts: counts.total,
            active_alerts: counts.active,
            acknowledged_alerts: counts.acknowledged,
            resolved_alerts: counts.resolved,
            suppressed_alerts: counts.suppressed,
            expired_alerts: counts.expired,
            avg_resolution_minutes: self.avg_resolution_minutes,
            avg_acknowledgment_minutes: self.avg_acknowledgment_minutes,
            by_severity: self.by_severity.clone(),
            by_category: self.by_category.clone(),
            by_source: self.by_source.clone(),
            hourly: self.hourly.clone(),
            daily: self.daily.clone(),
            top_types,
        }
    }
}
