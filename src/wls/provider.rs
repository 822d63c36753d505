//! WLS relying-party flow.
//!
//! Issues the challenge redirect, or drives a returned response through
//! parsing, status, freshness and signature checks before handing the
//! principal to the caller's [`Verifier`].

use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use super::config::{WlsConfig, DEFAULT_RESPONSE_PARAM};
use super::error::{WlsError, WlsResult};
use super::keys::KeyStore;
use super::outcome::AuthOutcome;
use super::response::AssertionResponse;
use super::signature::SignatureVerifier;
use super::status::evaluate_status;
use super::timestamp::{parse_issue, Clock, FreshnessWindow, SystemClock};
use super::verify::{Verdict, Verifier};

/// Protocol version requested in the challenge.
pub const PROTOCOL_VERSION: &str = "2";

/// Inbound request as seen by the authenticator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthRequest {
    /// Original request URL (path and query), appended to the audience in the
    /// challenge.
    pub url: String,
    /// Raw WLS response, if the request carries one.
    pub response: Option<String>,
}

impl AuthRequest {
    pub fn new(url: impl Into<String>, response: Option<String>) -> Self {
        Self {
            url: url.into(),
            response,
        }
    }

    /// Build from a request URI, taking the response from query parameter
    /// `param`. Query values are percent-decoded.
    pub fn from_uri(uri: &str, param: &str) -> Self {
        let query = uri.split_once('?').map(|(_, q)| q).unwrap_or("");

        let response = query
            .split('&')
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .find(|(key, _)| *key == param)
            .map(|(_, value)| {
                // Form encoding uses '+' for space.
                let value = value.replace('+', " ");
                urlencoding::decode(&value)
                    .map(|s| s.into_owned())
                    .unwrap_or(value)
            });

        Self {
            url: uri.to_string(),
            response,
        }
    }

    /// The response, if present and non-empty.
    pub fn assertion(&self) -> Option<&str> {
        self.response.as_deref().filter(|r| !r.is_empty())
    }
}

/// WLS authenticator.
pub struct WlsAuthenticator<V: Verifier> {
    /// Active configuration.
    config: RwLock<WlsConfig>,
    /// Signature checks, backed by a key store over `config.key_dir`.
    signatures: RwLock<SignatureVerifier>,
    /// Maps verified principals to users.
    verifier: V,
    clock: Arc<dyn Clock>,
}

impl<V: Verifier> WlsAuthenticator<V> {
    /// Create an authenticator. The configuration must validate.
    pub fn new(config: WlsConfig, verifier: V) -> WlsResult<Self> {
        Self::with_clock(config, verifier, Arc::new(SystemClock))
    }

    /// Create an authenticator reading time from `clock`.
    pub fn with_clock(config: WlsConfig, verifier: V, clock: Arc<dyn Clock>) -> WlsResult<Self> {
        config.validate().map_err(WlsError::Config)?;

        let keys = Arc::new(KeyStore::new(config.key_dir.clone()));
        Ok(Self {
            config: RwLock::new(config),
            signatures: RwLock::new(SignatureVerifier::new(keys)),
            verifier,
            clock,
        })
    }

    /// Replace the configuration.
    ///
    /// A new key directory gets a fresh key store; otherwise loaded keys are
    /// kept.
    pub fn reconfigure(&self, config: WlsConfig) -> WlsResult<()> {
        config.validate().map_err(WlsError::Config)?;

        let mut cfg = self
            .config
            .write()
            .map_err(|_| WlsError::Config("config lock poisoned".to_string()))?;

        if cfg.key_dir != config.key_dir {
            let mut signatures = self
                .signatures
                .write()
                .map_err(|_| WlsError::Config("key store lock poisoned".to_string()))?;
            *signatures = SignatureVerifier::new(Arc::new(KeyStore::new(config.key_dir.clone())));
            info!(key_dir = ?config.key_dir, "WLS key directory changed");
        }
        *cfg = config;

        info!("WLS authenticator reconfigured");
        Ok(())
    }

    /// Get a clone of the current config.
    pub fn config(&self) -> WlsResult<WlsConfig> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| WlsError::Config("config lock poisoned".to_string()))
    }

    /// Key store used for signature checks.
    pub fn keys(&self) -> WlsResult<Arc<KeyStore>> {
        self.signatures().map(|s| Arc::clone(s.keys()))
    }

    fn signatures(&self) -> WlsResult<SignatureVerifier> {
        self.signatures
            .read()
            .map(|s| s.clone())
            .map_err(|_| WlsError::Config("key store lock poisoned".to_string()))
    }

    /// Query parameter the response is expected in.
    pub fn response_param(&self) -> String {
        self.config()
            .map(|c| c.response_param)
            .unwrap_or_else(|_| DEFAULT_RESPONSE_PARAM.to_string())
    }

    /// Authenticate a request, producing exactly one outcome.
    pub async fn authenticate(&self, request: &AuthRequest) -> AuthOutcome<V::User> {
        let Some(raw) = request.assertion() else {
            return match self.challenge_url(&request.url) {
                Ok(url) => {
                    info!(url = %url, "No WLS response, redirecting to identity service");
                    AuthOutcome::Redirect { url }
                }
                Err(e) => AuthOutcome::Error(e),
            };
        };

        let response = match self.check_response(raw) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, code = e.code(), "WLS response rejected");
                return AuthOutcome::from_error(e);
            }
        };

        self.delegate(response).await
    }

    /// Challenge URL sending the user to the identity service and back to
    /// `original_url` under the audience.
    pub fn challenge_url(&self, original_url: &str) -> WlsResult<String> {
        let config = self.config()?;
        Ok(build_challenge(&config, original_url))
    }

    /// Run every check up to, but not including, delegation. The first
    /// failing stage ends the check.
    pub fn check_response(&self, raw: &str) -> WlsResult<AssertionResponse> {
        let config = self.config()?;
        let response = AssertionResponse::parse(raw)?;

        evaluate_status(&response.status)?;

        let issued = parse_issue(&response.issue)?;
        FreshnessWindow::new(config.clock_offset_ms, config.clock_margin_ms)
            .check(issued, self.clock.now())?;

        debug!(kid = %response.kid, "Checking WLS response signature");
        self.signatures()?.check(&response)?;
        debug!(id = %response.id, "WLS response signature check passed");

        Ok(response)
    }

    async fn delegate(&self, response: AssertionResponse) -> AuthOutcome<V::User> {
        let principal = response.principal.clone();

        match self.verifier.verify(&principal, &response).await {
            Ok(Verdict::Accept { user, info }) => {
                info!(principal = %principal, "WLS authentication successful");
                AuthOutcome::Success {
                    principal,
                    user,
                    info,
                }
            }
            Ok(Verdict::Reject { info }) => {
                info!(principal = %principal, "Verifier declined WLS principal");
                AuthOutcome::Fail { info }
            }
            Err(e) => {
                let cause = match e.downcast::<WlsError>() {
                    Ok(wls) => wls,
                    Err(other) => WlsError::Callback(other),
                };
                warn!(principal = %principal, error = %cause, "WLS verification callback failed");
                AuthOutcome::Error(cause)
            }
        }
    }
}

fn build_challenge(config: &WlsConfig, original_url: &str) -> String {
    let return_url = format!("{}{}", config.audience, original_url);

    let mut params = vec![("ver", PROTOCOL_VERSION), ("url", return_url.as_str())];
    if let Some(ref desc) = config.description {
        params.push(("desc", desc.as_str()));
    }
    params.push(("params", ""));

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    debug!(return_url = %return_url, "Built WLS challenge");
    format!("{}?{}", config.login_url, query)
}
