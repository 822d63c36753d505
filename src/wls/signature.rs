//! Response signature verification.
//!
//! The identity service signs everything before the kid field with RSA
//! PKCS#1 v1.5 over SHA-1 and ships the signature in a base64 variant that
//! swaps `+/=` for `-._` so it survives in a URL.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ring::signature::{UnparsedPublicKey, RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY};
use std::sync::Arc;
use tracing::debug;

use super::error::{WlsError, WlsResult};
use super::keys::KeyStore;
use super::response::AssertionResponse;

/// Translate the WLS base64 alphabet to standard base64.
pub fn wls_decode(sig: &str) -> String {
    sig.chars()
        .map(|c| match c {
            '-' => '+',
            '.' => '/',
            '_' => '=',
            other => other,
        })
        .collect()
}

/// Translate standard base64 to the WLS alphabet.
pub fn wls_encode(sig: &str) -> String {
    sig.chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '.',
            '=' => '_',
            other => other,
        })
        .collect()
}

/// Decode a signature field to raw signature bytes.
pub fn decode_signature(sig: &str) -> WlsResult<Vec<u8>> {
    let unescaped = percent_decode(sig)?;
    BASE64
        .decode(wls_decode(&unescaped))
        .map_err(|e| WlsError::SignatureInvalid(format!("invalid signature encoding: {}", e)))
}

fn percent_decode(value: &str) -> WlsResult<String> {
    urlencoding::decode(value)
        .map(|s| s.into_owned())
        .map_err(|e| WlsError::SignatureInvalid(format!("invalid percent-encoding: {}", e)))
}

/// Verifies response signatures with keys from a shared [`KeyStore`].
#[derive(Clone)]
pub struct SignatureVerifier {
    keys: Arc<KeyStore>,
}

impl SignatureVerifier {
    pub fn new(keys: Arc<KeyStore>) -> Self {
        Self { keys }
    }

    /// Key store backing this verifier.
    pub fn keys(&self) -> &Arc<KeyStore> {
        &self.keys
    }

    /// Verify the response signature.
    ///
    /// Returns `Ok(false)` for a well-formed signature that does not match.
    /// Key lookup failures and undecodable input are errors.
    pub fn verify(&self, response: &AssertionResponse) -> WlsResult<bool> {
        let key = self.keys.get_key(&response.kid)?;
        let payload = percent_decode(response.signed_payload())?;
        let signature = decode_signature(&response.sig)?;

        let public_key =
            UnparsedPublicKey::new(&RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY, key.as_der());
        let valid = public_key.verify(payload.as_bytes(), &signature).is_ok();

        debug!(kid = %response.kid, valid, "Checked WLS response signature");
        Ok(valid)
    }

    /// Verify the signature, turning a mismatch into an error.
    pub fn check(&self, response: &AssertionResponse) -> WlsResult<()> {
        if self.verify(response)? {
            Ok(())
        } else {
            Err(WlsError::SignatureInvalid(
                "signature does not match response".to_string(),
            ))
        }
    }
}
