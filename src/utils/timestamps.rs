use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{ProcessingError, Result};
use crate::utils::constants::OUTPUT_TIME_FORMAT;

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse an ISO-like timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let trimmed = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    // a trailing "Z" or "UTC" marker on an otherwise naive value
    let naive_text = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix(" UTC"))
        .unwrap_or(trimmed);

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_text, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive_text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(ProcessingError::InvalidFormat(format!(
        "Unrecognised timestamp: '{}'",
        text
    )))
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(OUTPUT_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_variants() {
        let expected = Utc.with_ymd_and_hms(2022, 3, 14, 6, 30, 0).unwrap();
        for text in [
            "2022-03-14 06:30:00",
            "2022-03-14T06:30:00",
            "2022-03-14T06:30:00Z",
            "2022-03-14 06:30",
            "2022-03-14 06:30:00+00:00",
            "2022-03-14T08:30:00+02:00",
            "2022-03-14 06:30:00.000",
        ] {
            assert_eq!(parse_timestamp(text).unwrap(), expected, "failed on {}", text);
        }
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(
            parse_timestamp("2015-01-21").unwrap(),
            Utc.with_ymd_and_hms(2015, 1, 21, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("NaT").is_err());
        assert!(parse_timestamp("82.1").is_err());
    }

    #[test]
    fn test_format_timestamp() {
        let t = Utc.with_ymd_and_hms(2022, 3, 14, 6, 30, 0).unwrap();
        assert_eq!(format_timestamp(&t), "2022-03-14 06:30:00");
    }
}
