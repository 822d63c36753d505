//! Caller-supplied mapping from a verified principal to an application user.

use anyhow::Result;
use async_trait::async_trait;
use std::marker::PhantomData;
use tokio::sync::oneshot;

use super::error::WlsError;
use super::response::AssertionResponse;

/// Decision returned by a [`Verifier`].
#[derive(Debug)]
pub enum Verdict<U> {
    /// The principal maps to `user`.
    Accept {
        user: U,
        info: Option<serde_json::Value>,
    },
    /// No user for this principal.
    Reject { info: Option<serde_json::Value> },
}

/// Maps a verified principal to an application user.
///
/// Called once per response, only after the signature has been checked.
/// An `Err` becomes an `Error` outcome.
#[async_trait]
pub trait Verifier: Send + Sync {
    type User: Send;

    async fn verify(
        &self,
        principal: &str,
        response: &AssertionResponse,
    ) -> Result<Verdict<Self::User>>;
}

/// Accepts every principal as the user id.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrincipalVerifier;

#[async_trait]
impl Verifier for PrincipalVerifier {
    type User = String;

    async fn verify(&self, principal: &str, _response: &AssertionResponse) -> Result<Verdict<String>> {
        Ok(Verdict::Accept {
            user: principal.to_string(),
            info: None,
        })
    }
}

/// Single-use completion handle for callback-style verifiers.
///
/// Every completing method takes `self`, so a handle reports at most once.
/// Dropping it unused reports [`WlsError::CallbackAbandoned`].
pub struct Completion<U> {
    tx: oneshot::Sender<Result<Verdict<U>>>,
}

impl<U> Completion<U> {
    /// Complete with an explicit result.
    pub fn complete(self, result: Result<Verdict<U>>) {
        // The receiver is gone only if the authentication was abandoned.
        let _ = self.tx.send(result);
    }

    /// Complete in `(error, user, info)` form.
    pub fn done(self, error: Option<anyhow::Error>, user: Option<U>, info: Option<serde_json::Value>) {
        let result = match (error, user) {
            (Some(err), _) => Err(err),
            (None, None) => Ok(Verdict::Reject { info }),
            (None, Some(user)) => Ok(Verdict::Accept { user, info }),
        };
        self.complete(result);
    }

    pub fn accept(self, user: U, info: Option<serde_json::Value>) {
        self.complete(Ok(Verdict::Accept { user, info }));
    }

    pub fn reject(self, info: Option<serde_json::Value>) {
        self.complete(Ok(Verdict::Reject { info }));
    }

    pub fn error(self, err: impl Into<anyhow::Error>) {
        self.complete(Err(err.into()));
    }
}

/// Adapts a callback that reports through a [`Completion`], possibly later
/// and from another task.
pub struct CallbackVerifier<U, F> {
    callback: F,
    _user: PhantomData<fn() -> U>,
}

impl<U, F> CallbackVerifier<U, F>
where
    F: Fn(String, AssertionResponse, Completion<U>) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _user: PhantomData,
        }
    }
}

#[async_trait]
impl<U, F> Verifier for CallbackVerifier<U, F>
where
    U: Send + 'static,
    F: Fn(String, AssertionResponse, Completion<U>) + Send + Sync,
{
    type User = U;

    async fn verify(&self, principal: &str, response: &AssertionResponse) -> Result<Verdict<U>> {
        let (tx, rx) = oneshot::channel();
        (self.callback)(principal.to_string(), response.clone(), Completion { tx });

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(WlsError::CallbackAbandoned.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn response() -> AssertionResponse {
        AssertionResponse::parse("2!200!!20240101T120000Z!1!http://a!alice!pwd!!!!kid1!sig")
            .unwrap()
    }

    #[tokio::test]
    async fn test_principal_verifier() {
        match PrincipalVerifier.verify("alice", &response()).await.unwrap() {
            Verdict::Accept { user, info } => {
                assert_eq!(user, "alice");
                assert!(info.is_none());
            }
            other => panic!("expected Accept, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deferred_completion() {
        let verifier = CallbackVerifier::new(|principal: String, _response, done: Completion<String>| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.done(None, Some(principal.to_uppercase()), None);
            });
        });

        match verifier.verify("alice", &response()).await.unwrap() {
            Verdict::Accept { user, .. } => assert_eq!(user, "ALICE"),
            other => panic!("expected Accept, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_done_without_user_rejects() {
        let verifier = CallbackVerifier::new(|_principal, _response, done: Completion<String>| {
            done.done(None, None, Some(serde_json::json!({ "message": "unknown user" })));
        });

        match verifier.verify("mallory", &response()).await.unwrap() {
            Verdict::Reject { info } => {
                assert_eq!(info, Some(serde_json::json!({ "message": "unknown user" })));
            }
            other => panic!("expected Reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_done_with_error() {
        let verifier = CallbackVerifier::new(|_principal, _response, done: Completion<String>| {
            done.done(Some(anyhow::anyhow!("directory offline")), Some("ignored".to_string()), None);
        });

        let err = verifier.verify("alice", &response()).await.unwrap_err();
        assert_eq!(err.to_string(), "directory offline");
    }

    #[tokio::test]
    async fn test_dropped_completion_is_abandoned() {
        let verifier = CallbackVerifier::new(|_principal, _response, done: Completion<String>| {
            drop(done);
        });

        let err = verifier.verify("alice", &response()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WlsError>(),
            Some(WlsError::CallbackAbandoned)
        ));
    }
}
