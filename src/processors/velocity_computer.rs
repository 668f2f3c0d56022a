use chrono::Duration;
use tracing::{debug, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{TimedPositions, VelocitySample};
use crate::utils::constants::MIN_ELAPSED_SECONDS;
use crate::utils::geodesy::{haversine_distance, initial_bearing};

/// Derives drift speed and bearing from consecutive positions.
///
/// Distances are great-circle distances on a sphere of mean Earth radius.
/// Each sample is stamped with the later of its two positions.
pub struct VelocityComputer {
    min_elapsed_seconds: f64,
    max_gap: Option<Duration>,
}

impl VelocityComputer {
    pub fn new() -> Self {
        Self {
            min_elapsed_seconds: MIN_ELAPSED_SECONDS,
            max_gap: None,
        }
    }

    /// Skip pairs further apart than `max_gap`, such as the last and first
    /// samples of two segments.
    pub fn with_max_gap(mut self, max_gap: Duration) -> Self {
        self.max_gap = Some(max_gap);
        self
    }

    /// Lazily derive one sample per consecutive pair of present positions.
    ///
    /// A pair whose elapsed time is zero or negative yields an error item;
    /// iteration continues with the next pair.
    pub fn derive_velocity<'a, T: TimedPositions>(&self, track: &'a T) -> VelocityIter<'a, T> {
        VelocityIter {
            source: track,
            index: 0,
            min_elapsed_seconds: self.min_elapsed_seconds,
            max_gap: self.max_gap,
        }
    }

    /// Collect the derived series, counting rejected pairs instead of failing.
    pub fn compute<T: TimedPositions>(&self, track: &T, buoy_id: &str) -> DerivedVelocity {
        let mut derived = DerivedVelocity::default();

        for item in self.derive_velocity(track) {
            match item {
                Ok(sample) => derived.samples.push(sample),
                Err(e) => {
                    warn!(buoy = %buoy_id, error = %e, "velocity pair rejected");
                    derived.rejected_pairs += 1;
                }
            }
        }

        debug!(
            buoy = %buoy_id,
            samples = derived.samples.len(),
            rejected = derived.rejected_pairs,
            "velocity derivation complete"
        );

        derived
    }
}

impl Default for VelocityComputer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedVelocity {
    pub samples: Vec<VelocitySample>,
    pub rejected_pairs: usize,
}

pub struct VelocityIter<'a, T> {
    source: &'a T,
    index: usize,
    min_elapsed_seconds: f64,
    max_gap: Option<Duration>,
}

impl<T: TimedPositions> Iterator for VelocityIter<'_, T> {
    type Item = Result<VelocitySample>;

    fn next(&mut self) -> Option<Self::Item> {
        let count = self.source.position_count();

        while self.index + 1 < count {
            let (t1, c1) = self.source.position_at(self.index);
            let (t2, c2) = self.source.position_at(self.index + 1);
            self.index += 1;

            // a missing position on either side breaks the pair
            let (from, to) = match (c1, c2) {
                (Some(from), Some(to)) => (from, to),
                _ => continue,
            };

            if self.max_gap.is_some_and(|gap| t2 - t1 > gap) {
                continue;
            }

            let elapsed = (t2 - t1).num_milliseconds() as f64 / 1000.0;
            if elapsed < self.min_elapsed_seconds {
                return Some(Err(ProcessingError::InvalidInput(format!(
                    "elapsed time {}s between {} and {} is too small to derive velocity",
                    elapsed, t1, t2
                ))));
            }

            let speed = haversine_distance(&from, &to) / elapsed;
            let bearing = initial_bearing(&from, &to);
            return Some(Ok(VelocitySample::new(t2, speed, bearing)));
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .source
            .position_count()
            .saturating_sub(self.index + 1);
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, GridPoint, PositionSample, ResampledTrack, Track};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    #[test]
    fn test_one_degree_in_one_hour() {
        let track = Track::new(
            "b",
            vec![
                PositionSample::new(at(0), 80.0, 5.0),
                PositionSample::new(at(1), 81.0, 5.0),
            ],
        );
        let samples: Vec<VelocitySample> = VelocityComputer::new()
            .derive_velocity(&track)
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(samples.len(), 1);
        let expected = 30.92;
        assert!(
            (samples[0].speed - expected).abs() / expected < 0.005,
            "speed was {}",
            samples[0].speed
        );
        assert!(samples[0].bearing.abs() < 1e-6);
        assert_eq!(samples[0].date, at(1));
    }

    #[test]
    fn test_antimeridian_pair_is_short() {
        let track = Track::new(
            "b",
            vec![
                PositionSample::new(at(0), 72.0, 179.9),
                PositionSample::new(at(1), 72.0, -179.9),
            ],
        );
        let derived = VelocityComputer::new().compute(&track, "b");
        let distance = derived.samples[0].speed * 3600.0;
        assert!(distance < 50_000.0, "distance was {}", distance);
        assert!((derived.samples[0].bearing - 90.0).abs() < 1.0);
    }

    #[test]
    fn test_missing_points_break_pairs() {
        let points = vec![
            GridPoint::observed(at(0), Coordinate::new(80.0, 0.0)),
            GridPoint::interpolated(at(1), Coordinate::new(80.01, 0.0)),
            GridPoint::missing(at(2)),
            GridPoint::missing(at(3)),
            GridPoint::observed(at(4), Coordinate::new(80.05, 0.0)),
            GridPoint::observed(at(5), Coordinate::new(80.06, 0.0)),
            GridPoint::observed(at(6), Coordinate::new(80.07, 0.0)),
        ];
        let resampled = ResampledTrack::new("b", Duration::hours(1), points);
        let derived = VelocityComputer::new().compute(&resampled, "b");

        // runs of 2 and 3 present points give 1 + 2 samples
        let dates: Vec<DateTime<Utc>> = derived.samples.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![at(1), at(5), at(6)]);
        assert_eq!(derived.rejected_pairs, 0);
    }

    #[test]
    fn test_zero_elapsed_rejects_only_that_pair() {
        let track = Track::new(
            "b",
            vec![
                PositionSample::new(at(0), 80.0, 0.0),
                PositionSample::new(at(1), 80.1, 0.0),
                PositionSample::new(at(1), 80.2, 0.0),
                PositionSample::new(at(2), 80.3, 0.0),
            ],
        );
        let items: Vec<Result<VelocitySample>> =
            VelocityComputer::new().derive_velocity(&track).collect();

        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(ProcessingError::InvalidInput(_))));
        assert!(items[2].is_ok());
        assert!(items.iter().flatten().all(|s| s.speed.is_finite() && s.speed >= 0.0));
    }

    #[test]
    fn test_max_gap_skips_pairs_across_outage() {
        let track = Track::new(
            "b",
            vec![
                PositionSample::new(at(0), 80.0, 0.0),
                PositionSample::new(at(1), 80.1, 0.0),
                PositionSample::new(at(7), 80.2, 0.0),
                PositionSample::new(at(8), 80.3, 0.0),
            ],
        );

        let all = VelocityComputer::new().compute(&track, "b");
        assert_eq!(all.samples.len(), 3);

        let split = VelocityComputer::new()
            .with_max_gap(Duration::hours(4))
            .compute(&track, "b");
        let dates: Vec<DateTime<Utc>> = split.samples.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![at(1), at(8)]);
        assert_eq!(split.rejected_pairs, 0);
    }

    #[test]
    fn test_short_input_yields_nothing() {
        let track = Track::new("b", vec![PositionSample::new(at(0), 80.0, 0.0)]);
        assert_eq!(VelocityComputer::new().derive_velocity(&track).count(), 0);
    }
}
