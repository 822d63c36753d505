//! Terminal authentication outcomes.

use super::error::WlsError;

/// The single result of one authentication attempt.
#[derive(Debug)]
pub enum AuthOutcome<U> {
    /// Send the user to the identity service.
    Redirect { url: String },
    /// The response verified and the verifier accepted the principal.
    Success {
        principal: String,
        user: U,
        info: Option<serde_json::Value>,
    },
    /// Authentication was declined; presenting the login option again is safe.
    Fail { info: Option<serde_json::Value> },
    /// Protocol or integrity failure.
    Error(WlsError),
}

/// Host capability receiving outcomes.
pub trait OutcomeSink<U> {
    fn redirect(&mut self, url: String);
    fn success(&mut self, user: U, info: Option<serde_json::Value>);
    fn fail(&mut self, info: Option<serde_json::Value>);
    fn error(&mut self, cause: WlsError);
}

impl<U> AuthOutcome<U> {
    /// Map a verification failure to its outcome.
    ///
    /// A cancellation becomes `Fail` carrying the status message; everything
    /// else is an `Error`.
    pub fn from_error(err: WlsError) -> Self {
        match err {
            WlsError::Cancelled { message } => AuthOutcome::Fail {
                info: Some(serde_json::json!({ "message": message })),
            },
            other => AuthOutcome::Error(other),
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, AuthOutcome::Redirect { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, AuthOutcome::Fail { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AuthOutcome::Error(_))
    }

    /// Outcome kind as a lowercase tag.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthOutcome::Redirect { .. } => "redirect",
            AuthOutcome::Success { .. } => "success",
            AuthOutcome::Fail { .. } => "fail",
            AuthOutcome::Error(_) => "error",
        }
    }

    /// Hand the outcome to a sink. Exactly one sink method is called.
    pub fn deliver<S: OutcomeSink<U> + ?Sized>(self, sink: &mut S) {
        match self {
            AuthOutcome::Redirect { url } => sink.redirect(url),
            AuthOutcome::Success { user, info, .. } => sink.success(user, info),
            AuthOutcome::Fail { info } => sink.fail(info),
            AuthOutcome::Error(cause) => sink.error(cause),
        }
    }
}
