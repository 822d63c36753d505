//! WLS response parsing.

use serde::Serialize;
use tracing::debug;

use super::error::{WlsError, WlsResult};

/// Field delimiter of a WLS response.
pub const DELIMITER: char = '!';

/// Field names of a WLS response, in wire order.
pub const RESPONSE_FIELDS: [&str; 13] = [
    "ver", "status", "msg", "issue", "id", "url", "principal", "auth", "sso", "life", "params",
    "kid", "sig",
];

/// Number of trailing fields (kid, sig) excluded from the signed payload.
const UNSIGNED_TRAILER: usize = 2;

/// A WLS response split into its named fields.
///
/// Fields hold the raw segment text. The original string is kept so the
/// signed payload can be taken from it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssertionResponse {
    pub ver: String,
    pub status: String,
    pub msg: String,
    pub issue: String,
    pub id: String,
    pub url: String,
    pub principal: String,
    pub auth: String,
    pub sso: String,
    pub life: String,
    pub params: String,
    pub kid: String,
    pub sig: String,
    #[serde(skip)]
    raw: String,
}

impl AssertionResponse {
    /// Parse a raw response. Anything other than exactly 13 fields is rejected.
    pub fn parse(raw: &str) -> WlsResult<Self> {
        let segments: Vec<&str> = raw.split(DELIMITER).collect();
        if segments.len() != RESPONSE_FIELDS.len() {
            debug!(segments = segments.len(), "Incorrect length of WLS response");
            return Err(WlsError::MalformedResponse {
                segments: segments.len(),
            });
        }

        let field = |i: usize| segments[i].to_string();

        Ok(Self {
            ver: field(0),
            status: field(1),
            msg: field(2),
            issue: field(3),
            id: field(4),
            url: field(5),
            principal: field(6),
            auth: field(7),
            sso: field(8),
            life: field(9),
            params: field(10),
            kid: field(11),
            sig: field(12),
            raw: raw.to_string(),
        })
    }

    /// The response exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Everything before the kid field, taken from the raw string.
    pub fn signed_payload(&self) -> &str {
        let mut end = self.raw.len();
        for _ in 0..UNSIGNED_TRAILER {
            end = self.raw[..end].rfind(DELIMITER).unwrap_or(0);
        }
        &self.raw[..end]
    }

    /// Look up a field by its wire name.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "ver" => &self.ver,
            "status" => &self.status,
            "msg" => &self.msg,
            "issue" => &self.issue,
            "id" => &self.id,
            "url" => &self.url,
            "principal" => &self.principal,
            "auth" => &self.auth,
            "sso" => &self.sso,
            "life" => &self.life,
            "params" => &self.params,
            "kid" => &self.kid,
            "sig" => &self.sig,
            _ => return None,
        };
        Some(value.as_str())
    }
}
