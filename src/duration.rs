use std::sync::LazyLock;

use chrono::Duration;
use regex::Regex;
use thiserror::Error;

const HOUR_MILLIS: f64 = 3_600_000.0;

/// Default poll interval when the configuration leaves it empty.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::hours(2);

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d*\.\d+|\d+)([^\d.]*)").expect("valid token pattern"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationParseError {
    #[error("no duration tokens found in '{0}'")]
    Empty(String),
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unknown duration unit '{unit}' in '{input}'")]
    UnknownUnit { unit: String, input: String },
    #[error("expected a single <number><unit> token, got '{0}'")]
    NotSingleToken(String),
    #[error("duration '{0}' is out of range")]
    OutOfRange(String),
}

/// Hours represented by one unit of a relative-age token.
fn age_unit_hours(unit: &str) -> Option<f64> {
    match unit {
        "d" | "D" => Some(24.0),
        "w" | "W" => Some(7.0 * 24.0),
        "M" | "mo" => Some(30.0 * 24.0),
        "y" | "Y" => Some(365.0 * 24.0),
        _ => None,
    }
}

/// Hours for the poll-interval units, which also accept clock units.
fn interval_unit_hours(unit: &str) -> Option<f64> {
    match unit {
        "s" => Some(1.0 / 3600.0),
        "m" => Some(1.0 / 60.0),
        "h" => Some(1.0),
        other => age_unit_hours(other),
    }
}

/// Leading run of ASCII letters, so "d ago" and "d" both read as "d".
fn unit_of(suffix: &str) -> &str {
    let suffix = suffix.trim_start();
    let end = suffix
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(suffix.len());
    &suffix[..end]
}

fn parse_tokens(
    input: &str,
    hours_for: fn(&str) -> Option<f64>,
) -> Result<Vec<f64>, DurationParseError> {
    let mut hours = Vec::new();

    for captures in TOKEN.captures_iter(input) {
        let number = &captures[1];
        let value: f64 = number
            .parse()
            .map_err(|_| DurationParseError::InvalidNumber(number.to_string()))?;

        let unit = unit_of(&captures[2]);
        let unit_hours = hours_for(unit).ok_or_else(|| DurationParseError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        hours.push(value * unit_hours);
    }

    if hours.is_empty() {
        return Err(DurationParseError::Empty(input.to_string()));
    }

    Ok(hours)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn from_hours(hours: f64, input: &str) -> Result<Duration, DurationParseError> {
    let millis = (hours * HOUR_MILLIS).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(DurationParseError::OutOfRange(input.to_string()));
    }

    Duration::try_milliseconds(millis as i64)
        .ok_or_else(|| DurationParseError::OutOfRange(input.to_string()))
}

/// Parses a relative age such as `"10d"`, `"-1.5w"` or `"3Y4M5d"`.
///
/// Units are case-sensitive: `d`/`D` days, `w`/`W` weeks, `M`/`mo` 30-day
/// months and `y`/`Y` 365-day years.
pub fn parse_age(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };

    let total: f64 = parse_tokens(body, age_unit_hours)?.into_iter().sum();
    let duration = from_hours(total, trimmed)?;

    Ok(if negative { -duration } else { duration })
}

/// Parses the configured poll interval, e.g. `"2h"`, `"30m"` or `"1d"`.
///
/// Exactly one token is accepted. An empty string yields
/// [`DEFAULT_POLL_INTERVAL`].
pub fn parse_interval(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_POLL_INTERVAL);
    }

    let tokens = parse_tokens(trimmed, interval_unit_hours)?;
    match tokens.as_slice() {
        [hours] if *hours > 0.0 => from_hours(*hours, trimmed),
        _ => Err(DurationParseError::NotSingleToken(trimmed.to_string())),
    }
}

/// Sleep period for a poll interval; non-positive intervals use the default.
#[must_use]
pub fn poll_period(interval: Duration) -> std::time::Duration {
    let interval = if interval > Duration::zero() {
        interval
    } else {
        DEFAULT_POLL_INTERVAL
    };

    std::time::Duration::from_millis(interval.num_milliseconds().unsigned_abs())
}
