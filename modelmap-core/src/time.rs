//! UTC timestamp utilities.
//!
//! All timestamps handled by the mapping layer are ISO-8601 strings in UTC with
//! the trailing `Z` designator. Strings without the designator are rejected
//! rather than being reinterpreted as local time.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{ModelMapError, ModelMapResult};

/// Returns the current time as a UTC ISO-8601 string with trailing `Z`.
pub fn format_iso_now() -> String {
    format_iso(Utc::now())
}

/// Formats the given instant as a UTC ISO-8601 string with trailing `Z`.
pub fn format_iso(when: DateTime<Utc>) -> String {
    when.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a UTC ISO-8601 string with trailing `Z`.
///
/// # Errors
///
/// Returns [`ModelMapError::Timestamp`] when the trailing designator is missing
/// or the string is otherwise malformed.
pub fn parse_iso(input: &str) -> ModelMapResult<DateTime<Utc>> {
    if !input.ends_with('Z') {
        return Err(ModelMapError::Timestamp(input.to_string()));
    }
    DateTime::parse_from_rfc3339(input)
        .map(|when| when.with_timezone(&Utc))
        .map_err(|_| ModelMapError::Timestamp(input.to_string()))
}

/// Formats how long ago the given instant was, in the coarsest nonzero unit.
pub fn format_timesince(when: DateTime<Utc>) -> String {
    let secs = (Utc::now() - when).num_seconds().max(0);
    let days = secs / (3600 * 24);
    let hrs = secs / 3600;
    let mins = secs / 60;
    if days > 0 {
        format!("{days}d")
    } else if hrs > 0 {
        format!("{hrs}h")
    } else if mins > 0 {
        format!("{mins}m")
    } else {
        format!("{secs}s")
    }
}
