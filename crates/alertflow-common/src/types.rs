use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use alertflow_common::types::Severity;
///
/// let sev: Severity = "high".parse().unwrap();
/// assert_eq!(sev, Severity::High);
/// assert_eq!(sev.to_string(), "high");
/// assert!(Severity::Critical > Severity::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Alert lifecycle status.
///
/// Transitions follow a fixed state machine: `Active → Acknowledged →
/// Resolved`, `Active → Resolved` (direct, e.g. auto-resolve),
/// `Active → Suppressed`, `Active → Expired`. `Resolved` and `Expired`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
    Suppressed,
    Expired,
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertStatus::Active => write!(f, "active"),
            AlertStatus::Acknowledged => write!(f, "acknowledged"),
            AlertStatus::Resolved => write!(f, "resolved"),
            AlertStatus::Suppressed => write!(f, "suppressed"),
            AlertStatus::Expired => write!(f, "expired"),
        }
    }
}

impl AlertStatus {
    /// True for states no transition may leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved | AlertStatus::Expired)
    }
}

/// A single reported condition with a lifecycle status.
///
/// Created by the ingestion pipeline, mutated by acknowledge/resolve
/// calls and the periodic evaluators. Never physically deleted: terminal
/// alerts are retained for statistics and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    /// Free-text origin system (e.g., "device-telemetry", "billing").
    pub source: String,
    /// Alert type key, resolved against the rule registry.
    #[serde(rename = "type")]
    pub alert_type: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    /// Opaque payload supplied by the caller.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Opaque metadata (origin system, environment, correlation/trace ids).
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub status: AlertStatus,
    /// 1-100, higher is more urgent.
    pub priority: u8,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    pub resolution: Option<String>,
    /// Explicit deadline after which the alert is marked expired.
    pub expires_at: Option<DateTime<Utc>>,
    pub last_occurrence: DateTime<Utc>,
    /// Number of merged occurrences, >= 1 and only ever increases.
    pub occurrence_count: u32,
    /// Only ever increases.
    pub escalation_level: u32,
    /// Minutes until auto-resolve, inherited from the alert type at creation.
    pub auto_resolve_timeout: Option<i64>,
}

/// Alert creation payload supplied by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub source: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    /// Overrides the alert type's default severity when set.
    #[serde(default)]
    pub severity: Option<Severity>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Overrides the alert type's default priority when set.
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Condition operator applied by the condition evaluator.
///
/// Unrecognized operators deserialize to [`ConditionOp::Unknown`], which
/// always evaluates to false: a malformed rule fails closed instead of
/// halting the evaluation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOp {
    Equals,
    Contains,
    MatchesRegex,
    In,
    GreaterThan,
    LessThan,
    /// Minutes since the alert was created, compared against the
    /// condition value.
    NotResolvedFor,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConditionOp::Equals => "equals",
            ConditionOp::Contains => "contains",
            ConditionOp::MatchesRegex => "matches_regex",
            ConditionOp::In => "in",
            ConditionOp::GreaterThan => "greater_than",
            ConditionOp::LessThan => "less_than",
            ConditionOp::NotResolvedFor => "not_resolved_for",
            ConditionOp::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// A single (field, operator, value) condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Alert attribute name (the valid set depends on the rule kind,
    /// e.g. escalation rules accept severity/priority/occurrence_count/duration).
    pub field: String,
    pub operator: ConditionOp,
    pub value: serde_json::Value,
}

/// Notification delivery channel kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Push,
    Sms,
    Email,
    Webhook,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelKind::Push => write!(f, "push"),
            ChannelKind::Sms => write!(f, "sms"),
            ChannelKind::Email => write!(f, "email"),
            ChannelKind::Webhook => write!(f, "webhook"),
        }
    }
}

/// Escalation action executed when an escalation rule fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EscalationAction {
    /// Raise the alert's severity and bump its escalation level.
    IncreaseSeverity { to: Severity },
    NotifyManager {
        #[serde(default)]
        params: serde_json::Value,
    },
    CreateTicket {
        #[serde(default)]
        params: serde_json::Value,
    },
    SendEmail {
        #[serde(default)]
        params: serde_json::Value,
    },
    SendSms {
        #[serde(default)]
        params: serde_json::Value,
    },
    Webhook {
        #[serde(default)]
        params: serde_json::Value,
    },
}

impl EscalationAction {
    /// Action kind name, as used in logs and serialized payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            EscalationAction::IncreaseSeverity { .. } => "increase_severity",
            EscalationAction::NotifyManager { .. } => "notify_manager",
            EscalationAction::CreateTicket { .. } => "create_ticket",
            EscalationAction::SendEmail { .. } => "send_email",
            EscalationAction::SendSms { .. } => "send_sms",
            EscalationAction::Webhook { .. } => "webhook",
        }
    }
}

/// Escalation rule attached to an alert type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRule {
    /// Valid fields: severity, priority, occurrence_count, duration.
    pub condition: Condition,
    pub action: EscalationAction,
    /// The alert must have existed at least this long before the rule
    /// becomes eligible.
    pub delay_minutes: i64,
    pub active: bool,
}

/// Notification rule attached to an alert type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRule {
    /// Valid fields: severity, priority, category.
    pub condition: Condition,
    pub channels: BTreeSet<ChannelKind>,
    pub delay_minutes: i64,
    pub active: bool,
}

/// Global suppression rule, evaluated at ingestion time only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionRule {
    pub id: String,
    /// Valid fields: source, type, category, title.
    pub condition: Condition,
    /// The rule only matches within this many minutes of its creation;
    /// 0 means no time bound.
    pub duration_minutes: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Correlation action executed when a correlation rule's threshold is met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CorrelationAction {
    /// Side-effect only: matched alerts are reported as a group.
    Group,
    /// Set status = suppressed on every matched alert still active.
    Suppress,
    /// Increment the escalation level on every matched alert.
    Escalate,
    /// Side-effect only: parent-alert synthesis is an external concern.
    CreateParentAlert,
}

/// Time-windowed correlation rule over the whole alert population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRule {
    pub id: String,
    pub name: String,
    /// AND-combined.
    pub conditions: Vec<Condition>,
    pub time_window_minutes: i64,
    pub min_alerts: usize,
    pub action: CorrelationAction,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Reusable alert template: defaults plus rule sets applied to alerts of
/// this type. Created/updated by configuration, read-only during alert
/// processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertType {
    pub id: String,
    pub name: String,
    pub category: String,
    pub default_severity: Severity,
    /// 1-100.
    pub default_priority: u8,
    pub auto_resolve: bool,
    /// Minutes, inherited by alerts of this type at creation.
    pub auto_resolve_timeout_minutes: Option<i64>,
    #[serde(default)]
    pub escalation_rules: Vec<EscalationRule>,
    #[serde(default)]
    pub notification_rules: Vec<NotificationRule>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query filters for listing alerts. All fields optional; results are
/// newest-first by creation time.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub user_id: Option<String>,
    pub device_id: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<AlertStatus>,
    pub category: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Per-type frequency entry for the "top alert types" breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeFrequency {
    #[serde(rename = "type")]
    pub alert_type: String,
    pub count: u64,
}

/// Derived, recomputable statistics snapshot.
///
/// The five status counts are recomputed from the alert store on every
/// query; the breakdowns and rollups are maintained incrementally at
/// creation time and are eventually-consistent approximations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub total_alerts: u64,
    pub active_alerts: u64,
    pub acknowledged_alerts: u64,
    pub resolved_alerts: u64,
    pub suppressed_alerts: u64,
    pub expired_alerts: u64,
    /// Rolling average, smoothed as (old + new) / 2 on each sample.
    pub avg_resolution_minutes: f64,
    pub avg_acknowledgment_minutes: f64,
    pub by_severity: HashMap<String, u64>,
    pub by_category: HashMap<String, u64>,
    pub by_source: HashMap<String, u64>,
    /// Keyed "YYYY-MM-DDTHH".
    pub hourly: HashMap<String, u64>,
    /// Keyed "YYYY-MM-DD".
    pub daily: HashMap<String, u64>,
    pub top_types: Vec<TypeFrequency>,
}

/// A scheduled notification handed off to the delivery collaborator.
///
/// Fire-and-forget: the engine does not retry, confirm, or cancel intents
/// once scheduled, even if the alert resolves first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationIntent {
    pub alert_id: String,
    pub channels: BTreeSet<ChannelKind>,
    pub severity: Severity,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
}

/// An escalation side effect handed off to the escalation sink
/// (manager notification, ticket creation, email/SMS, webhook).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationEffect {
    pub alert_id: String,
    pub action: EscalationAction,
}
