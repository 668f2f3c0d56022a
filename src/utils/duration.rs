use chrono::Duration;

use crate::error::{ProcessingError, Result};

/// Parse a duration such as `"4h"`, `"1H"`, `"240min"`, `"4 hours"` or `"1h30min"`.
///
/// Units: `d`/`day(s)`, `h`/`hr`/`hour(s)`, `m`/`min`/`minute(s)`/`T`,
/// `s`/`sec`/`second(s)`. A bare number is taken as minutes.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ProcessingError::InvalidDuration(text.to_string()));
    }

    let invalid = || ProcessingError::InvalidDuration(text.to_string());

    if let Ok(minutes) = trimmed.parse::<i64>() {
        return Duration::try_minutes(minutes).ok_or_else(invalid);
    }

    let mut total = Duration::zero();
    let mut rest = trimmed;

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return Err(ProcessingError::InvalidDuration(text.to_string()));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| ProcessingError::InvalidDuration(text.to_string()))?;
        rest = rest[number_len..].trim_start();

        let unit_len = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = rest[unit_len..].trim_start();

        let seconds_per_unit = match unit {
            "d" | "D" | "day" | "days" => 86_400.0,
            "h" | "H" | "hr" | "hrs" | "hour" | "hours" => 3_600.0,
            "m" | "min" | "mins" | "minute" | "minutes" | "T" => 60.0,
            "s" | "S" | "sec" | "secs" | "second" | "seconds" => 1.0,
            _ => return Err(ProcessingError::InvalidDuration(text.to_string())),
        };

        let millis = (value * seconds_per_unit * 1000.0).round();
        if !millis.is_finite() || millis >= i64::MAX as f64 {
            return Err(invalid());
        }
        total = Duration::try_milliseconds(millis as i64)
            .and_then(|part| total.checked_add(&part))
            .ok_or_else(invalid)?;
    }

    Ok(total)
}

/// Render a duration compactly, e.g. `4h`, `90min`, `45s`.
pub fn format_duration(duration: &Duration) -> String {
    let seconds = duration.num_seconds();
    if seconds != 0 && seconds % 3_600 == 0 {
        format!("{}h", seconds / 3_600)
    } else if seconds != 0 && seconds % 60 == 0 {
        format!("{}min", seconds / 60)
    } else if duration.num_milliseconds() % 1000 == 0 {
        format!("{}s", seconds)
    } else {
        format!("{}ms", duration.num_milliseconds())
    }
}

/// Serde adapter storing a [`Duration`] as duration text.
pub mod serde_text {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
