//! Zentinel WLS Authentication Agent
//!
//! Command-line front end for the WLS relying-party flow: prints the
//! challenge redirect for a request, or verifies a returned WLS response and
//! reports the outcome as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use zentinel_agent_wls::wls::{
    AuthOutcome, AuthRequest, OutcomeSink, PrincipalVerifier, WlsAuthenticator, WlsConfig,
    WlsConfigJson, WlsError,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "zentinel-agent-wls")]
#[command(about = "WLS (Raven) authentication agent")]
struct Args {
    /// JSON configuration file
    #[arg(long, env = "WLS_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the protected application
    #[arg(long, env = "WLS_AUDIENCE")]
    audience: Option<String>,

    /// Site description shown by the identity service
    #[arg(long, env = "WLS_DESCRIPTION")]
    description: Option<String>,

    /// Known local clock drift in milliseconds
    #[arg(long, env = "WLS_CLOCK_OFFSET_MS", allow_hyphen_values = true)]
    clock_offset_ms: Option<i64>,

    /// Accepted clock margin in milliseconds
    #[arg(long, env = "WLS_CLOCK_MARGIN_MS")]
    clock_margin_ms: Option<i64>,

    /// Directory holding pubkey<kid>.crt files
    #[arg(long, env = "WLS_KEY_DIR")]
    key_dir: Option<PathBuf>,

    /// Identity service login URL
    #[arg(long, env = "WLS_LOGIN_URL")]
    login_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, env = "WLS_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the identity-service redirect for a request URL
    Challenge {
        /// Original request URL (path and query)
        #[arg(default_value = "/")]
        url: String,
    },
    /// Verify the WLS response carried by a request URI
    Verify {
        /// Request URI including the response query parameter
        uri: String,
    },
}

impl Args {
    /// Layer defaults, the JSON file and command line flags.
    fn build_config(&self) -> Result<WlsConfig> {
        let mut config = WlsConfig::default();

        if let Some(path) = &self.config {
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let json: WlsConfigJson = serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            json.apply_to(&mut config);
        }

        let overrides = WlsConfigJson {
            audience: self.audience.clone(),
            description: self.description.clone(),
            clock_offset_ms: self.clock_offset_ms,
            clock_margin_ms: self.clock_margin_ms,
            key_dir: self.key_dir.clone(),
            login_url: self.login_url.clone(),
            response_param: None,
        };
        overrides.apply_to(&mut config);

        config.validate().map_err(|e| anyhow!(e))?;
        Ok(config)
    }
}

/// JSON report of an outcome.
#[derive(Debug, Default, Serialize)]
struct OutcomeReport {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl OutcomeReport {
    fn is_ok(&self) -> bool {
        matches!(self.outcome, "redirect" | "success")
    }
}

impl OutcomeSink<String> for OutcomeReport {
    fn redirect(&mut self, url: String) {
        self.outcome = "redirect";
        self.url = Some(url);
    }

    fn success(&mut self, user: String, info: Option<serde_json::Value>) {
        self.outcome = "success";
        self.user = Some(user);
        self.info = info;
    }

    fn fail(&mut self, info: Option<serde_json::Value>) {
        self.outcome = "fail";
        self.info = info;
    }

    fn error(&mut self, cause: WlsError) {
        self.outcome = "error";
        self.code = Some(cause.code());
        self.error = Some(cause.to_string());
    }
}

fn report(outcome: AuthOutcome<String>) -> OutcomeReport {
    let mut report = OutcomeReport::default();
    outcome.deliver(&mut report);
    report
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = args.build_config()?;

    info!(
        audience = %config.audience,
        key_dir = ?config.key_dir,
        clock_offset_ms = config.clock_offset_ms,
        clock_margin_ms = config.clock_margin_ms,
        "Configuration loaded"
    );

    let authenticator = WlsAuthenticator::new(config, PrincipalVerifier)?;

    let request = match &args.command {
        Command::Challenge { url } => AuthRequest::new(url.clone(), None),
        Command::Verify { uri } => AuthRequest::from_uri(uri, &authenticator.response_param()),
    };
    debug!(url = %request.url, has_response = request.assertion().is_some(), "Authenticating");

    let report = report(authenticator.authenticate(&request).await);
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_ok() {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    /// Arguments with no flags and no environment fallback.
    fn bare_args(command: Command) -> Args {
        Args {
            config: None,
            audience: None,
            description: None,
            clock_offset_ms: None,
            clock_margin_ms: None,
            key_dir: None,
            login_url: None,
            verbose: false,
            command,
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "zentinel-agent-wls",
            "--audience",
            "https://app.example.com",
            "--clock-margin-ms",
            "5000",
            "--clock-offset-ms",
            "-1500",
            "challenge",
            "/private",
        ]);

        assert_eq!(args.audience.as_deref(), Some("https://app.example.com"));
        assert_eq!(args.clock_margin_ms, Some(5000));
        assert_eq!(args.clock_offset_ms, Some(-1500));
        assert!(matches!(args.command, Command::Challenge { ref url } if url == "/private"));

        let mut flags = bare_args(Command::Challenge {
            url: "/private".to_string(),
        });
        flags.audience = args.audience.clone();
        flags.clock_margin_ms = args.clock_margin_ms;
        flags.clock_offset_ms = args.clock_offset_ms;

        let config = flags.build_config().unwrap();
        assert_eq!(config.audience, "https://app.example.com");
        assert_eq!(config.clock_margin_ms, 5000);
        assert_eq!(config.clock_offset_ms, -1500);
    }

    #[test]
    fn test_config_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wls.json");
        std::fs::write(
            &path,
            r#"{"audience": "https://file.example.com", "description": "From file", "key-dir": "/srv/keys"}"#,
        )
        .unwrap();

        let mut args = bare_args(Command::Verify {
            uri: "/?WLS-Response=x".to_string(),
        });
        args.config = Some(path.clone());
        args.audience = Some("https://flag.example.com".to_string());

        let config = args.build_config().unwrap();
        assert_eq!(config.audience, "https://flag.example.com");
        assert_eq!(config.description.as_deref(), Some("From file"));
        assert_eq!(config.key_dir, PathBuf::from("/srv/keys"));
    }

    #[test]
    fn test_missing_audience_fails() {
        let args = bare_args(Command::Challenge {
            url: "/".to_string(),
        });
        assert!(args.build_config().is_err());

        let args = parse(&["zentinel-agent-wls", "challenge"]);
        assert!(matches!(args.command, Command::Challenge { ref url } if url == "/"));
    }

    #[test]
    fn test_report() {
        let ok = report(AuthOutcome::Success {
            principal: "alice".to_string(),
            user: "alice".to_string(),
            info: None,
        });
        assert!(ok.is_ok());
        assert_eq!(ok.user.as_deref(), Some("alice"));

        let failed = report(AuthOutcome::Error(WlsError::MalformedResponse { segments: 2 }));
        assert!(!failed.is_ok());
        assert_eq!(failed.code, Some("MALFORMED_RESPONSE"));

        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["outcome"], "error");
        assert!(json.get("user").is_none());
    }
}
