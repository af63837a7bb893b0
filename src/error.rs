//! Error types for session-gate.

use thiserror::Error;

/// Main error type for session-gate operations.
#[derive(Error, Debug)]
pub enum GateError {
    /// The hosted provider answered with a non-success status.
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// Email/password pair was rejected.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Operation needs a signed-in session.
    #[error("not signed in")]
    NotSignedIn,

    /// Provider response could not be interpreted.
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// The gate has already been shut down.
    #[error("session gate stopped")]
    GateStopped,

    /// The gate's update task panicked or was cancelled.
    #[error("gate task failed: {0}")]
    TaskFailed(String),
}

/// Convenience Result type for session-gate operations.
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = GateError::Provider {
            status: 503,
            message: "upstream unavailable".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[test]
    fn test_invalid_credentials_display() {
        let err = GateError::InvalidCredentials;
        assert_eq!(err.to_string(), "invalid credentials");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let gate_err: GateError = io_err.into();
        assert!(matches!(gate_err, GateError::Io(_)));
        assert!(gate_err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let gate_err: GateError = json_err.into();
        assert!(matches!(gate_err, GateError::Json(_)));
    }
}
