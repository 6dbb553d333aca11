//! Date parsing for `date` attributes.
//!
//! ## Formats
//!
//! A [`DateFormat`] is either RFC 3339, Unix epoch seconds or milliseconds, or
//! a pattern. Patterns may be written in strftime syntax (`%Y-%m-%d`) or in
//! LDML syntax (`yyyy-MM-dd`, `dd/MM/yyyy HH:mm`). LDML patterns are
//! translated to strftime before parsing.
//!
//! ## Timezone Handling
//!
//! Values that carry no offset are interpreted in the configured time zone and
//! then converted to UTC. A local time that falls into a DST gap or overlap is
//! rejected instead of guessed.

use crate::error::{CoercionError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Naive formats accepted after RFC 3339 fails.
const RFC3339_FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// How date strings and numbers are read.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateFormat {
    /// RFC 3339 / ISO 8601, with common naive fallbacks.
    #[default]
    Rfc3339,
    /// Seconds since the Unix epoch.
    EpochSeconds,
    /// Milliseconds since the Unix epoch.
    EpochMillis,
    /// A strftime or LDML pattern.
    Pattern(String),
}

impl DateFormat {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }

    /// The strftime pattern used for parsing, if this is a pattern format.
    pub fn strftime(&self) -> Option<String> {
        match self {
            Self::Pattern(p) if p.contains('%') => Some(p.clone()),
            Self::Pattern(p) => Some(translate_ldml(p)),
            _ => None,
        }
    }
}

impl FromStr for DateFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "" | "rfc3339" | "iso8601" => Self::Rfc3339,
            "epoch_seconds" | "epoch" | "unix" => Self::EpochSeconds,
            "epoch_millis" | "unix_millis" => Self::EpochMillis,
            _ => Self::Pattern(s.to_string()),
        })
    }
}

impl From<String> for DateFormat {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(format) => format,
            Err(infallible) => match infallible {},
        }
    }
}

impl From<DateFormat> for String {
    fn from(value: DateFormat) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rfc3339 => f.write_str("rfc3339"),
            Self::EpochSeconds => f.write_str("epoch_seconds"),
            Self::EpochMillis => f.write_str("epoch_millis"),
            Self::Pattern(p) => f.write_str(p),
        }
    }
}

/// Translate an LDML date pattern into strftime syntax.
///
/// Quoted text (`'T'`) is copied literally and `''` is a single quote. `Y` and
/// `D` are read as `y` and `d`, since patterns such as `YYYY-MM-DD` are
/// almost always meant that way.
pub fn translate_ldml(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i += 1;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    break;
                }
                push_literal(&mut out, chars[i]);
                i += 1;
            }
            i += 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        let token = match (c, run) {
            ('y' | 'Y' | 'u', 2) => "%y",
            ('y' | 'Y' | 'u', _) => "%Y",
            ('M' | 'L', 1..=2) => "%m",
            ('M' | 'L', 3) => "%b",
            ('M' | 'L', _) => "%B",
            ('d' | 'D', _) => "%d",
            ('H' | 'k', _) => "%H",
            ('h' | 'K', _) => "%I",
            ('m', _) => "%M",
            ('s', _) => "%S",
            ('S', 1..=3) => "%3f",
            ('S', 4..=6) => "%6f",
            ('S', _) => "%9f",
            ('a', _) => "%p",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('Z', _) => "%z",
            ('X' | 'x', _) => "%:z",
            _ => {
                for _ in 0..run {
                    out.push(c);
                }
                i += run;
                continue;
            }
        };
        out.push_str(token);
        i += run;
    }

    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Parse a date string according to `format`.
///
/// Offset-less values are interpreted in `tz`. Date-only values resolve to
/// local midnight.
pub fn parse_date_str(value: &str, format: &DateFormat, tz: &Tz) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    let invalid = || CoercionError::InvalidDate {
        value: value.to_string(),
        format: format.to_string(),
    };

    match format {
        DateFormat::Rfc3339 => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%#z") {
                return Ok(dt.with_timezone(&Utc));
            }
            for fallback in RFC3339_FALLBACK_FORMATS {
                if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fallback) {
                    return localize(&naive, tz);
                }
            }
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                return localize(&date.and_time(chrono::NaiveTime::MIN), tz);
            }
            Err(invalid())
        }
        DateFormat::EpochSeconds | DateFormat::EpochMillis => {
            let number: f64 = trimmed.parse().map_err(|_| invalid())?;
            from_epoch(number, format)
        }
        DateFormat::Pattern(_) => {
            let pattern = format.strftime().unwrap_or_default();
            if let Ok(dt) = DateTime::parse_from_str(trimmed, &pattern) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, &pattern) {
                return localize(&naive, tz);
            }
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, &pattern) {
                return localize(&date.and_time(chrono::NaiveTime::MIN), tz);
            }
            Err(invalid())
        }
    }
}

/// Convert a numeric epoch value to an instant.
///
/// Numbers are milliseconds under [`DateFormat::EpochMillis`] and seconds
/// under every other format.
pub fn from_epoch(number: f64, format: &DateFormat) -> Result<DateTime<Utc>> {
    let out_of_range = || CoercionError::InvalidDate {
        value: number.to_string(),
        format: format.to_string(),
    };
    if !number.is_finite() {
        return Err(out_of_range());
    }

    let millis = match format {
        DateFormat::EpochMillis => number,
        _ => number * 1000.0,
    };
    if millis.abs() > i64::MAX as f64 {
        return Err(out_of_range());
    }

    let whole = millis.floor();
    let nanos = ((millis - whole) * 1_000_000.0).round() as i64;
    DateTime::from_timestamp_millis(whole as i64)
        .and_then(|dt| dt.checked_add_signed(chrono::Duration::nanoseconds(nanos)))
        .ok_or_else(out_of_range)
}

fn localize(naive: &NaiveDateTime, tz: &Tz) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| CoercionError::AmbiguousDateTime {
            timezone: tz.name().to_string(),
            datetime: naive.to_string(),
        })
}
