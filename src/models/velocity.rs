use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Drift speed and heading between two consecutive positions.
///
/// `date` is the timestamp of the later of the two positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocitySample {
    pub date: DateTime<Utc>,
    /// Metres per second, never negative.
    pub speed: f64,
    /// Forward azimuth in degrees, in `[0, 360)`.
    pub bearing: f64,
}

impl VelocitySample {
    pub fn new(date: DateTime<Utc>, speed: f64, bearing: f64) -> Self {
        Self {
            date,
            speed,
            bearing,
        }
    }
}
