//! Call session error types.
//!
//! Extraction failures never show up here: a participant that cannot produce
//! a video request is simply skipped. These errors cover pagination,
//! permissions and failures reported by the engine.

use call_model::ModelError;
use thiserror::Error;

/// Call session error type.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A roster page fetch is already running for this session.
    #[error("A roster page is already being loaded")]
    LoadMoreInProgress,

    /// The full roster has already been delivered.
    #[error("Roster is complete")]
    RosterComplete,

    /// The engine replaced the roster while a page was being fetched.
    #[error("Roster changed while the page was loading")]
    RosterChanged,

    /// Schedule subscription toggled on a call that is not scheduled.
    #[error("Call is not scheduled")]
    NotScheduled,

    /// A newer request of the same kind replaced this one before it reached the engine.
    #[error("Request superseded by a newer one")]
    Superseded,

    /// The local user lacks the right or the device permission for the action.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The engine reported a failure.
    #[error("Engine error: {0}")]
    Engine(String),

    /// The engine did not answer in time.
    #[error("Engine request timed out")]
    EngineTimeout,

    /// Invalid model input at the session boundary.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// The session has been cancelled.
    #[error("Session cancelled")]
    Cancelled,

    /// Internal error with context.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// Returns a bounded label string for the error variant (for metrics).
    ///
    /// Uses enum variant names, not error message content.
    pub fn error_type_label(&self) -> &'static str {
        match self {
            SessionError::LoadMoreInProgress => "load_more_in_progress",
            SessionError::RosterComplete => "roster_complete",
            SessionError::RosterChanged => "roster_changed",
            SessionError::NotScheduled => "not_scheduled",
            SessionError::Superseded => "superseded",
            SessionError::PermissionDenied(_) => "permission_denied",
            SessionError::Engine(_) => "engine",
            SessionError::EngineTimeout => "engine_timeout",
            SessionError::Model(_) => "model",
            SessionError::Cancelled => "cancelled",
            SessionError::Internal(_) => "internal",
        }
    }

    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::LoadMoreInProgress
                | SessionError::RosterChanged
                | SessionError::Engine(_)
                | SessionError::EngineTimeout
        )
    }
}
