//! WLS protocol error types.

use thiserror::Error;

/// Errors raised while verifying a WLS response.
#[derive(Debug, Error)]
pub enum WlsError {
    /// The response did not split into the expected number of fields.
    #[error("malformed WLS response: expected 13 fields, got {segments}")]
    MalformedResponse { segments: usize },

    /// The issue timestamp is not in `YYYYMMDDThhmmssZ` form.
    #[error("malformed issue timestamp: {0:?}")]
    MalformedTimestamp(String),

    /// The user cancelled authentication at the identity service (status 410).
    #[error("{message}")]
    Cancelled { message: String },

    /// The identity service reported a non-success status.
    #[error("status {code}: {message}")]
    Status { code: String, message: String },

    /// The response was issued outside the accepted clock margin.
    #[error("response timestamp out of date: {interval_ms}ms exceeds margin of {margin_ms}ms")]
    StaleResponse { interval_ms: i64, margin_ms: i64 },

    /// No key could be loaded for the key id.
    #[error("no public key for kid {kid:?}: {reason}")]
    KeyNotFound { kid: String, reason: String },

    /// Key material was found but is not a usable RSA public key.
    #[error("invalid public key for kid {kid:?}: {reason}")]
    InvalidKey { kid: String, reason: String },

    /// The signature did not verify or could not be decoded.
    #[error("response signature check failed: {0}")]
    SignatureInvalid(String),

    /// The verification callback reported an error.
    #[error("verification callback failed: {0}")]
    Callback(anyhow::Error),

    /// The verification callback was dropped without completing.
    #[error("verification callback dropped without completing")]
    CallbackAbandoned,

    /// Authenticator configuration is unusable.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WlsError {
    /// Whether the failure is a declined authentication that can be retried
    /// by presenting the login option again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WlsError::Cancelled { .. })
    }

    /// Short machine-readable code for audit output.
    pub fn code(&self) -> &'static str {
        match self {
            WlsError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            WlsError::MalformedTimestamp(_) => "MALFORMED_TIMESTAMP",
            WlsError::Cancelled { .. } => "CANCELLED",
            WlsError::Status { .. } => "STATUS_REJECTED",
            WlsError::StaleResponse { .. } => "STALE_RESPONSE",
            WlsError::KeyNotFound { .. } => "KEY_NOT_FOUND",
            WlsError::InvalidKey { .. } => "INVALID_KEY",
            WlsError::SignatureInvalid(_) => "SIGNATURE_INVALID",
            WlsError::Callback(_) => "CALLBACK_ERROR",
            WlsError::CallbackAbandoned => "CALLBACK_ABANDONED",
            WlsError::Config(_) => "CONFIG_ERROR",
        }
    }
}

/// Result type for WLS operations.
pub type WlsResult<T> = Result<T, WlsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancellation_is_recoverable() {
        let cancelled = WlsError::Cancelled {
            message: "cancelled".to_string(),
        };
        assert!(cancelled.is_recoverable());

        let declined = WlsError::Status {
            code: "570".to_string(),
            message: "declined".to_string(),
        };
        assert!(!declined.is_recoverable());
        assert!(!WlsError::SignatureInvalid("bad".to_string()).is_recoverable());
        assert!(!WlsError::CallbackAbandoned.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = WlsError::MalformedResponse { segments: 12 };
        assert_eq!(err.to_string(), "malformed WLS response: expected 13 fields, got 12");

        let err = WlsError::StaleResponse {
            interval_ms: 300000,
            margin_ms: 60000,
        };
        assert!(err.to_string().contains("300000ms"));
        assert_eq!(err.code(), "STALE_RESPONSE");
    }
}
