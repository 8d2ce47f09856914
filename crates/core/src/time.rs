//! Normalising the assorted timestamp shapes Memos emits.
//!
//! Depending on API version and endpoint a memo's creation time arrives as epoch
//! seconds, an RFC 3339 string, or a protobuf-style `{ "seconds": n }` object.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

/// Normalise `input` to an RFC 3339 UTC instant with millisecond precision.
///
/// Absent, falsy or unrecognised input resolves to the current time; this never fails.
pub fn normalize_time(input: Option<&Value>) -> String {
    resolve_instant(input, Utc::now).to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn resolve_instant(input: Option<&Value>, now: impl Fn() -> DateTime<Utc>) -> DateTime<Utc> {
    match input {
        None | Some(Value::Null) | Some(Value::Bool(false)) => now(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(secs) if secs != 0.0 => from_epoch_seconds(secs).unwrap_or_else(&now),
            _ => now(),
        },
        Some(Value::String(s)) if s.is_empty() => now(),
        Some(Value::String(s)) => parse_datetime(s).unwrap_or_else(|| {
            tracing::warn!(input = %s, "unparseable timestamp, using current time");
            now()
        }),
        Some(Value::Object(obj)) => obj
            .get("seconds")
            .and_then(Value::as_f64)
            .and_then(from_epoch_seconds)
            .unwrap_or_else(&now),
        Some(_) => now(),
    }
}

fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    let millis = (secs * 1000.0).round();
    if !millis.is_finite() {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
