//! WLS relying-party configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default identity-service login endpoint.
pub const DEFAULT_LOGIN_URL: &str = "https://raven.cam.ac.uk/auth/authenticate.html";

/// Default query parameter carrying the WLS response.
pub const DEFAULT_RESPONSE_PARAM: &str = "WLS-Response";

/// WLS relying-party configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WlsConfig {
    /// Base URL of this application. The original request URL is appended to
    /// it to form the return URL sent with the challenge.
    /// Example: "https://app.example.com"
    #[serde(default)]
    pub audience: String,

    /// Site description shown by the identity service. Optional.
    #[serde(default)]
    pub description: Option<String>,

    /// Known drift of the local clock in milliseconds, added to local time.
    #[serde(default)]
    pub clock_offset_ms: i64,

    /// Maximum accepted distance between local time and the issue time.
    #[serde(default = "default_clock_margin")]
    pub clock_margin_ms: i64,

    /// Directory holding one `pubkey<kid>.crt` file per key id.
    #[serde(default = "default_key_dir")]
    pub key_dir: PathBuf,

    /// Identity-service authentication endpoint.
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Query parameter carrying the response.
    #[serde(default = "default_response_param")]
    pub response_param: String,
}

fn default_clock_margin() -> i64 {
    60_000 // 1 minute
}

fn default_key_dir() -> PathBuf {
    PathBuf::from("/etc/wls/keys")
}

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

fn default_response_param() -> String {
    DEFAULT_RESPONSE_PARAM.to_string()
}

impl Default for WlsConfig {
    fn default() -> Self {
        Self {
            audience: String::new(),
            description: None,
            clock_offset_ms: 0,
            clock_margin_ms: default_clock_margin(),
            key_dir: default_key_dir(),
            login_url: default_login_url(),
            response_param: default_response_param(),
        }
    }
}

impl WlsConfig {
    /// Create a configuration for the given audience with defaults elsewhere.
    pub fn new(audience: impl Into<String>) -> Self {
        Self {
            audience: audience.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.audience.is_empty() {
            return Err("WLS audience is required".to_string());
        }

        if !is_http_url(&self.audience) {
            return Err("WLS audience must be a valid HTTP(S) URL".to_string());
        }

        if !is_http_url(&self.login_url) {
            return Err("WLS login_url must be a valid HTTP(S) URL".to_string());
        }

        if self.clock_margin_ms < 0 {
            return Err("WLS clock_margin_ms must not be negative".to_string());
        }

        if self.response_param.is_empty() {
            return Err("WLS response_param must not be empty".to_string());
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// JSON configuration for layered configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct WlsConfigJson {
    pub audience: Option<String>,
    pub description: Option<String>,
    pub clock_offset_ms: Option<i64>,
    pub clock_margin_ms: Option<i64>,
    pub key_dir: Option<PathBuf>,
    pub login_url: Option<String>,
    pub response_param: Option<String>,
}

impl WlsConfigJson {
    /// Apply JSON config to existing config.
    pub fn apply_to(&self, config: &mut WlsConfig) {
        if let Some(ref audience) = self.audience {
            config.audience = audience.clone();
        }
        if let Some(ref description) = self.description {
            config.description = Some(description.clone());
        }
        if let Some(offset) = self.clock_offset_ms {
            config.clock_offset_ms = offset;
        }
        if let Some(margin) = self.clock_margin_ms {
            config.clock_margin_ms = margin;
        }
        if let Some(ref dir) = self.key_dir {
            config.key_dir = dir.clone();
        }
        if let Some(ref url) = self.login_url {
            config.login_url = url.clone();
        }
        if let Some(ref param) = self.response_param {
            config.response_param = param.clone();
        }
    }
}
