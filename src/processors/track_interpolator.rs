use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{Coordinate, GridPoint, PointOrigin, ResampledTrack, Track};
use crate::utils::coordinates::normalize_longitude;
use crate::utils::geodesy::interpolate_coordinate;

/// Resamples a track onto a regular time grid.
///
/// Grid instants are whole multiples of `freq` since the Unix epoch, from the
/// first grid instant at or after the first sample up to the last sample.
/// Nothing is extrapolated.
pub struct TrackInterpolator {
    freq: Duration,
    maxgap: Duration,
}

impl TrackInterpolator {
    pub fn new(freq: Duration, maxgap_minutes: i64) -> Self {
        Self {
            freq,
            maxgap: Duration::try_minutes(maxgap_minutes).unwrap_or(Duration::MAX),
        }
    }

    pub fn with_maxgap(freq: Duration, maxgap: Duration) -> Self {
        Self { freq, maxgap }
    }

    /// Linear resampling; grid points inside an original gap wider than
    /// `maxgap` are left missing.
    pub fn interpolate(&self, track: &Track) -> Result<ResampledTrack> {
        let freq_ms = self.freq_ms()?;
        let samples = track.samples();

        let (first, last) = match (samples.first(), samples.last()) {
            (Some(f), Some(l)) => (f.timestamp.timestamp_millis(), l.timestamp.timestamp_millis()),
            _ => return Ok(ResampledTrack::new(track.buoy_id.clone(), self.freq, Vec::new())),
        };

        let maxgap_ms = self.maxgap.num_milliseconds();
        let mut points = Vec::new();
        let mut next = 0;
        let mut grid_ms = ceil_to_multiple(first, freq_ms);

        while grid_ms <= last {
            // first sample at or after the grid instant; exists because grid_ms <= last
            while samples[next].timestamp.timestamp_millis() < grid_ms {
                next += 1;
            }

            let timestamp = millis_to_datetime(grid_ms)?;
            let after = &samples[next];
            let after_ms = after.timestamp.timestamp_millis();

            let point = if after_ms == grid_ms {
                GridPoint::observed(timestamp, after.coordinate)
            } else {
                // grid_ms > first, so there is a sample strictly before it
                let before = &samples[next - 1];
                let before_ms = before.timestamp.timestamp_millis();
                let gap_ms = after_ms - before_ms;

                if gap_ms > maxgap_ms {
                    GridPoint::missing(timestamp)
                } else {
                    let fraction = (grid_ms - before_ms) as f64 / gap_ms as f64;
                    GridPoint::interpolated(
                        timestamp,
                        interpolate_coordinate(&before.coordinate, &after.coordinate, fraction),
                    )
                }
            };

            points.push(point);
            grid_ms += freq_ms;
        }

        let resampled = ResampledTrack::new(track.buoy_id.clone(), self.freq, points);

        debug!(
            buoy = %track.buoy_id,
            grid_points = resampled.len(),
            observed = resampled.count(PointOrigin::Observed),
            interpolated = resampled.count(PointOrigin::Interpolated),
            missing = resampled.count(PointOrigin::Missing),
            "interpolation complete"
        );

        Ok(resampled)
    }

    /// Mean position of the samples inside each `freq` cell, stamped with the
    /// start of the cell. Empty cells are missing.
    pub fn bin_average(&self, track: &Track) -> Result<ResampledTrack> {
        let freq_ms = self.freq_ms()?;
        let samples = track.samples();

        let (first, last) = match (samples.first(), samples.last()) {
            (Some(f), Some(l)) => (f.timestamp.timestamp_millis(), l.timestamp.timestamp_millis()),
            _ => return Ok(ResampledTrack::new(track.buoy_id.clone(), self.freq, Vec::new())),
        };

        let mut points = Vec::new();
        let mut next = 0;
        let mut cell_ms = first - first.rem_euclid(freq_ms);

        while cell_ms <= last {
            let mut accumulator = CircularMean::default();
            while next < samples.len() && samples[next].timestamp.timestamp_millis() < cell_ms + freq_ms {
                accumulator.add(&samples[next].coordinate);
                next += 1;
            }

            let timestamp = millis_to_datetime(cell_ms)?;
            points.push(match accumulator.mean() {
                Some(coordinate) => GridPoint::averaged(timestamp, coordinate),
                None => GridPoint::missing(timestamp),
            });
            cell_ms += freq_ms;
        }

        Ok(ResampledTrack::new(track.buoy_id.clone(), self.freq, points))
    }

    fn freq_ms(&self) -> Result<i64> {
        let freq_ms = self.freq.num_milliseconds();
        if freq_ms <= 0 {
            return Err(ProcessingError::InvalidInput(format!(
                "resampling frequency must be positive, got {} ms",
                freq_ms
            )));
        }
        Ok(freq_ms)
    }
}

/// Latitude averaged arithmetically, longitude on the unit circle.
#[derive(Default)]
struct CircularMean {
    count: usize,
    latitude_sum: f64,
    sin_sum: f64,
    cos_sum: f64,
}

impl CircularMean {
    fn add(&mut self, coordinate: &Coordinate) {
        let lambda = coordinate.longitude.to_radians();
        self.count += 1;
        self.latitude_sum += coordinate.latitude;
        self.sin_sum += lambda.sin();
        self.cos_sum += lambda.cos();
    }

    fn mean(&self) -> Option<Coordinate> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(Coordinate::new(
            self.latitude_sum / n,
            normalize_longitude(self.sin_sum.atan2(self.cos_sum).to_degrees()),
        ))
    }
}

fn ceil_to_multiple(value: i64, step: i64) -> i64 {
    let remainder = value.rem_euclid(step);
    if remainder == 0 {
        value
    } else {
        value + step - remainder
    }
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
        ProcessingError::InvalidInput(format!("grid instant {} ms is out of range", millis))
    })
}
