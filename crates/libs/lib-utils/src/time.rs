//! # Time Utilities
//!
//! Timestamps are always generated by the application in UTC so that every
//! stored row sorts consistently regardless of the database clock.

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current UTC time.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Format time as an RFC3339 string with millisecond precision (`2024-01-01T00:00:00.000Z`).
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
