//! Time utilities: epoch-millisecond message timestamps and local display.

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Parse a string-encoded epoch-millisecond timestamp like "1700000000000".
pub fn millis_to_utc(millis: &str) -> Option<DateTime<Utc>> {
    let ms: i64 = millis.trim().parse().ok()?;
    Utc.timestamp_millis_opt(ms).single()
}

/// Inverse of [`millis_to_utc`], used for synthetic ids.
pub fn utc_to_millis(dt: DateTime<Utc>) -> String {
    dt.timestamp_millis().to_string()
}

/// Render a UTC instant as "YYYY-MM-DD HH:MM" in an IANA tz like "Asia/Kolkata".
pub fn to_local_display(dt: DateTime<Utc>, tz: &str) -> Result<String> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(dt.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string())
}
