//! Zentinel WLS Authentication Agent
//!
//! Relying-party side of the WLS protocol used by the Raven identity
//! service. Hosts call [`WlsAuthenticator::authenticate`] for each request and
//! act on the returned [`AuthOutcome`].

pub mod wls;

pub use wls::{
    AssertionResponse, AuthOutcome, AuthRequest, KeyStore, OutcomeSink, Verdict, Verifier,
    WlsAuthenticator, WlsConfig, WlsConfigJson, WlsError,
};
