//! Issue timestamp parsing and freshness checks.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use super::error::{WlsError, WlsResult};

/// Compact UTC form used by the identity service: `YYYYMMDDThhmmssZ`.
const ISSUE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Parse an issue timestamp. The pattern must match exactly.
pub fn parse_issue(issue: &str) -> WlsResult<DateTime<Utc>> {
    let bytes = issue.as_bytes();
    let well_formed = bytes.len() == 16
        && bytes[8] == b'T'
        && bytes[15] == b'Z'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..15].iter().all(u8::is_ascii_digit);

    if !well_formed {
        return Err(WlsError::MalformedTimestamp(issue.to_string()));
    }

    NaiveDateTime::parse_from_str(issue, ISSUE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| WlsError::MalformedTimestamp(issue.to_string()))
}

/// Accepted distance between local time and the issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    /// Added to local time before comparing.
    pub clock_offset_ms: i64,
    /// Largest accepted absolute interval.
    pub clock_margin_ms: i64,
}

impl FreshnessWindow {
    pub fn new(clock_offset_ms: i64, clock_margin_ms: i64) -> Self {
        Self {
            clock_offset_ms,
            clock_margin_ms,
        }
    }

    /// Check an issue instant against `now`.
    ///
    /// Fails when `|now + offset - issued|` exceeds the margin.
    pub fn check(&self, issued: DateTime<Utc>, now: DateTime<Utc>) -> WlsResult<()> {
        let local = now.timestamp_millis().saturating_add(self.clock_offset_ms);
        let interval_ms = local.saturating_sub(issued.timestamp_millis()).saturating_abs();

        if interval_ms > self.clock_margin_ms {
            debug!(
                interval_ms,
                margin_ms = self.clock_margin_ms,
                "Timestamp out of date"
            );
            return Err(WlsError::StaleResponse {
                interval_ms,
                margin_ms: self.clock_margin_ms,
            });
        }

        Ok(())
    }
}
