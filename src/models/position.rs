use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::constants::{MAX_LATITUDE, MAX_LONGITUDE, MIN_LATITUDE, MIN_LONGITUDE};

/// Outcome of parsing one raw field.
///
/// Malformed input is kept as `Missing` together with the offending text so
/// that it can be reported; it is never replaced by a numeric sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Valid(T),
    Missing(String),
}

impl<T> Parsed<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Parsed::Valid(v) => Some(v),
            Parsed::Missing(_) => None,
        }
    }
}

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Coordinate {
    #[validate(range(min = MIN_LATITUDE, max = MAX_LATITUDE))]
    pub latitude: f64,

    #[validate(range(min = MIN_LONGITUDE, max = MAX_LONGITUDE))]
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the physical range.
    pub fn is_physical(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite() && self.validate().is_ok()
    }

    /// Exact match of the (latitude, longitude) pair.
    pub fn same_pair(&self, other: &Coordinate) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

/// One row of a buoy track after ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSample {
    pub timestamp: DateTime<Utc>,
    pub coordinate: Coordinate,
    /// Extra input columns, carried verbatim and never interpreted.
    pub passthrough: Vec<String>,
}

impl PositionSample {
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            coordinate: Coordinate::new(latitude, longitude),
            passthrough: Vec::new(),
        }
    }

    pub fn with_passthrough(mut self, passthrough: Vec<String>) -> Self {
        self.passthrough = passthrough;
        self
    }

    pub fn latitude(&self) -> f64 {
        self.coordinate.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.coordinate.longitude
    }
}

/// A row as read from disk, before missing fields are excluded.
#[derive(Debug, Clone)]
pub struct RawSample {
    pub timestamp: Parsed<DateTime<Utc>>,
    pub latitude: Parsed<f64>,
    pub longitude: Parsed<f64>,
    pub passthrough: Vec<String>,
}

/// Why a raw row did not become a [`PositionSample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingTimestamp,
    MissingCoordinate,
    OutOfRange,
}

impl RawSample {
    /// Convert to a position sample, or report why the row is excluded.
    pub fn into_sample(self) -> std::result::Result<PositionSample, Rejection> {
        let timestamp = self
            .timestamp
            .into_option()
            .ok_or(Rejection::MissingTimestamp)?;

        let (latitude, longitude) = match (self.latitude, self.longitude) {
            (Parsed::Valid(lat), Parsed::Valid(lon)) => (lat, lon),
            _ => return Err(Rejection::MissingCoordinate),
        };

        let coordinate = Coordinate::new(latitude, longitude);
        if !coordinate.is_physical() {
            return Err(Rejection::OutOfRange);
        }

        Ok(PositionSample {
            timestamp,
            coordinate,
            passthrough: self.passthrough,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_coordinate_range() {
        assert!(Coordinate::new(81.2, -179.99).is_physical());
        assert!(!Coordinate::new(90.5, 10.0).is_physical());
        assert!(!Coordinate::new(80.0, 180.5).is_physical());
        assert!(!Coordinate::new(f64::NAN, 10.0).is_physical());
        // bounds are inclusive
        assert!(Coordinate::new(MAX_LATITUDE, MIN_LONGITUDE).is_physical());
        assert!(Coordinate::new(MIN_LATITUDE, MAX_LONGITUDE).is_physical());
    }

    #[test]
    fn test_raw_sample_rejections() {
        let missing_lat = RawSample {
            timestamp: Parsed::Valid(ts()),
            latitude: Parsed::Missing("n/a".to_string()),
            longitude: Parsed::Valid(12.0),
            passthrough: vec![],
        };
        assert_eq!(
            missing_lat.into_sample().unwrap_err(),
            Rejection::MissingCoordinate
        );

        let missing_time = RawSample {
            timestamp: Parsed::Missing("yesterday".to_string()),
            latitude: Parsed::Valid(80.0),
            longitude: Parsed::Valid(12.0),
            passthrough: vec![],
        };
        assert_eq!(
            missing_time.into_sample().unwrap_err(),
            Rejection::MissingTimestamp
        );

        let out_of_range = RawSample {
            timestamp: Parsed::Valid(ts()),
            latitude: Parsed::Valid(95.0),
            longitude: Parsed::Valid(12.0),
            passthrough: vec![],
        };
        assert_eq!(out_of_range.into_sample().unwrap_err(), Rejection::OutOfRange);
    }

    #[test]
    fn test_raw_sample_keeps_passthrough() {
        let raw = RawSample {
            timestamp: Parsed::Valid(ts()),
            latitude: Parsed::Valid(80.0),
            longitude: Parsed::Valid(12.0),
            passthrough: vec!["-1.8".to_string(), "1013".to_string()],
        };
        let sample = raw.into_sample().unwrap();
        assert_eq!(sample.passthrough, vec!["-1.8", "1013"]);
        assert_eq!(sample.latitude(), 80.0);
    }
}
