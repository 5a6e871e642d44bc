use alertflow_common::types::AlertStatus;

/// Errors surfaced by the engine's caller-facing operations.
///
/// Condition evaluation is infallible (malformed rules fail closed) and
/// the periodic evaluators log-and-continue, so this taxonomy only covers
/// the synchronous API surface.
///
/// # Examples
///
/// ```rust
/// use alertflow_engine::error::EngineError;
///
/// let err = EngineError::NotFound { entity: "alert", id: "42".to_string() };
/// assert!(err.to_string().contains("alert"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required record was not found.
    #[error("Engine: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// The operation is not legal for the alert's current status
    /// (e.g., acknowledging a resolved alert).
    #[error("Engine: cannot {op} alert {id} in status '{status}'")]
    InvalidState {
        id: String,
        status: AlertStatus,
        op: &'static str,
    },

    /// A rule or alert payload failed field-level validation.
    #[error("Engine: validation failed: {0}")]
    Validation(String),
}

/// Convenience `Result` alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
