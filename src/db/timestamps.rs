// src/db/timestamps.rs
//
// Timestamp encoding for the SQLite store.
//
// All timestamps persist as RFC 3339 UTC text with fixed millisecond
// precision ("2026-08-30T12:34:56.789Z"). The fixed width matters: the
// expiry sweep compares `expires_at <= now` as strings inside SQL, which
// is only correct when every stored value has the same shape.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::AppResult;

/// Encode a timestamp for storage
pub fn to_db_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decode a stored timestamp
pub fn from_db_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)?;
    Ok(parsed.with_timezone(&Utc))
}
