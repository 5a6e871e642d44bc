/// Errors that can occur within the notification subsystem.
///
/// The [`crate::NotificationDelivery`] and [`crate::EscalationSink`] traits
/// return `anyhow::Result` so that external collaborator implementations can
/// surface transport-specific failures without a shared error type. This
/// module defines the typed errors used by the dispatcher itself.
///
/// # Examples
///
/// ```rust
/// use alertflow_notify::error::NotifyError;
///
/// let err = NotifyError::EmptyChannelSet { alert_id: "42".to_string() };
/// assert!(err.to_string().contains("42"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// An intent was scheduled without any target channel.
    #[error("Notify: intent for alert {alert_id} has an empty channel set")]
    EmptyChannelSet { alert_id: String },

    /// JSON serialization of an intent or effect failed.
    #[error("Notify: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic notification error for cases not covered by other variants.
    #[error("Notify: {0}")]
    Other(String),
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
