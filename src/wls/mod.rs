//! WLS (Raven) relying-party authentication.
//!
//! Verifies signed responses from a WLS identity service: the response is
//! split into its 13 fields, its status and issue time are checked, and its
//! RSA/SHA-1 signature is verified against a public key selected by key id
//! before the principal is handed to a caller-supplied verifier.

pub mod config;
pub mod error;
pub mod keys;
pub mod outcome;
pub mod provider;
pub mod response;
pub mod signature;
pub mod status;
pub mod timestamp;
pub mod verify;

pub use config::{WlsConfig, WlsConfigJson};
pub use error::{WlsError, WlsResult};
pub use keys::{KeyStore, VerificationKey};
pub use outcome::{AuthOutcome, OutcomeSink};
pub use provider::{AuthRequest, WlsAuthenticator};
pub use response::AssertionResponse;
pub use signature::SignatureVerifier;
pub use timestamp::{Clock, FixedClock, FreshnessWindow, SystemClock};
pub use verify::{CallbackVerifier, Completion, PrincipalVerifier, Verdict, Verifier};
