//! WLS status code evaluation.

use tracing::debug;

use super::error::{WlsError, WlsResult};

/// Status of a successful authentication.
pub const STATUS_OK: &str = "200";

/// Status reported when the user cancelled at the identity service.
pub const STATUS_CANCELLED: &str = "410";

/// Human-readable message for a status code.
pub fn status_message(code: &str) -> String {
    let known = match code {
        "410" => "Authentication was cancelled by the user.",
        "510" => "No mutually acceptable authentication types available.",
        "520" => "Unsupported WLS protocol version.",
        "530" => "Authentication failed due to error in request.",
        "560" => "WAA not authorised to authenticate.",
        "570" => "Authentication was declined on this occasion.",
        _ => return format!("Authentication failed with unknown status {}", code),
    };
    known.to_string()
}

/// Check the status field.
///
/// `200` proceeds. `410` is a cancellation, every other value a protocol
/// failure.
pub fn evaluate_status(code: &str) -> WlsResult<()> {
    if code == STATUS_OK {
        return Ok(());
    }

    let message = status_message(code);
    debug!(status = %code, message = %message, "WLS response carries non-success status");

    if code == STATUS_CANCELLED {
        Err(WlsError::Cancelled { message })
    } else {
        Err(WlsError::Status {
            code: code.to_string(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_proceeds() {
        assert!(evaluate_status("200").is_ok());
    }

    #[test]
    fn test_cancelled_is_recoverable() {
        let err = evaluate_status("410").unwrap_err();
        assert!(matches!(err, WlsError::Cancelled { .. }));
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Authentication was cancelled by the user.");
    }

    // Guards against treating every non-200 status as a cancellation.
    #[test]
    fn test_other_statuses_are_errors() {
        for code in ["510", "520", "530", "560", "570", "999", "", "2000", " 200"] {
            let err = evaluate_status(code).unwrap_err();
            assert!(!err.is_recoverable(), "status {code:?} must not be recoverable");
            match err {
                WlsError::Status { code: c, .. } => assert_eq!(c, code),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            status_message("570"),
            "Authentication was declined on this occasion."
        );
        assert_eq!(
            status_message("404"),
            "Authentication failed with unknown status 404"
        );
    }
}
