use tracing::debug;

use crate::models::{BooleanMask, PositionSample, Track};
use crate::utils::constants::DEFAULT_MAX_SPEED_MPS;
use crate::utils::geodesy::haversine_distance;

/// Reason a sample was flagged by [`PositionValidator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionFlag {
    DuplicateTimestamp,
    OutOfRange,
    DuplicatePosition,
    ExcessiveSpeed,
}

/// Flags duplicated or nonphysical positions.
///
/// Each sample is compared with the closest earlier sample that was kept, so a
/// single bad fix does not also condemn the good fix after it. An anchor with
/// no kept predecessor is unconfirmed: when a sample is too fast from it but
/// agrees with the sample after it, the anchor is flagged instead.
pub struct PositionValidator {
    pairs_only: bool,
    max_speed_mps: f64,
}

impl PositionValidator {
    pub fn new(pairs_only: bool) -> Self {
        Self {
            pairs_only,
            max_speed_mps: DEFAULT_MAX_SPEED_MPS,
        }
    }

    pub fn with_max_speed(mut self, max_speed_mps: f64) -> Self {
        self.max_speed_mps = max_speed_mps;
        self
    }

    /// Drop mask for `track`; `true` marks samples to remove.
    pub fn validate(&self, track: &Track) -> BooleanMask {
        let flags = self.classify(track);
        let mask = BooleanMask::from_flags(flags.iter().map(Option::is_some).collect());

        debug!(
            buoy = %track.buoy_id,
            flagged = mask.flagged_count(),
            total = mask.len(),
            pairs_only = self.pairs_only,
            "position check complete"
        );

        mask
    }

    /// Per-sample flag with the reason, `None` for kept samples.
    pub fn classify(&self, track: &Track) -> Vec<Option<PositionFlag>> {
        let samples = track.samples();
        let mut flags = vec![None; samples.len()];

        if samples.len() < 2 {
            return flags;
        }

        // index of the last kept sample, and whether a neighbour has vouched for it
        let mut anchor: Option<(usize, bool)> = None;
        for (i, sample) in samples.iter().enumerate() {
            let flag = match anchor {
                None if !sample.coordinate.is_physical() => Some(PositionFlag::OutOfRange),
                None => None,
                Some((a, confirmed)) => {
                    let flag = self.check_pair(&samples[a], sample);
                    if flag == Some(PositionFlag::ExcessiveSpeed)
                        && !confirmed
                        && self.agrees_with_next(samples, i)
                    {
                        flags[a] = Some(PositionFlag::ExcessiveSpeed);
                        anchor = Some((i, true));
                        continue;
                    }
                    flag
                }
            };

            if flag.is_none() {
                // a sample kept after a comparison confirms both ends of the pair
                anchor = Some((i, anchor.is_some()));
            }
            flags[i] = flag;
        }

        flags
    }

    fn check_pair(&self, prev: &PositionSample, curr: &PositionSample) -> Option<PositionFlag> {
        if curr.timestamp <= prev.timestamp {
            return Some(PositionFlag::DuplicateTimestamp);
        }

        if !curr.coordinate.is_physical() {
            return Some(PositionFlag::OutOfRange);
        }

        if curr.coordinate.same_pair(&prev.coordinate) {
            return Some(PositionFlag::DuplicatePosition);
        }

        if !self.pairs_only && self.implied_speed(prev, curr) > self.max_speed_mps {
            return Some(PositionFlag::ExcessiveSpeed);
        }

        None
    }

    /// Sample `i` and the one after it form a plausible pair.
    fn agrees_with_next(&self, samples: &[PositionSample], i: usize) -> bool {
        match samples.get(i + 1) {
            Some(next) => {
                next.timestamp > samples[i].timestamp
                    && next.coordinate.is_physical()
                    && self.implied_speed(&samples[i], next) <= self.max_speed_mps
            }
            None => false,
        }
    }

    fn implied_speed(&self, from: &PositionSample, to: &PositionSample) -> f64 {
        let elapsed = (to.timestamp - from.timestamp).num_milliseconds() as f64 / 1000.0;
        haversine_distance(&from.coordinate, &to.coordinate) / elapsed
    }
}

impl Default for PositionValidator {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 4, 10, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn track(points: &[(i64, f64, f64)]) -> Track {
        Track::new(
            "test",
            points
                .iter()
                .map(|(m, lat, lon)| PositionSample::new(at(*m), *lat, *lon))
                .collect(),
        )
    }

    #[test]
    fn test_short_track_is_not_flagged() {
        let validator = PositionValidator::new(true);
        assert_eq!(validator.validate(&track(&[])).len(), 0);
        let mask = validator.validate(&track(&[(0, 95.0, 10.0)]));
        assert_eq!(mask.as_slice(), &[false]);
    }

    #[test]
    fn test_adjacent_duplicate_pairs_are_flagged() {
        let t = track(&[
            (0, 80.0, 10.0),
            (60, 80.0, 10.0),
            (120, 80.0, 10.0),
            (180, 80.01, 10.0),
            (240, 80.0, 10.0),
        ]);
        let mask = PositionValidator::new(true).validate(&t);
        // The repeat after a move back is not adjacent to its twin.
        assert_eq!(mask.as_slice(), &[false, true, true, false, false]);
    }

    #[test]
    fn test_retained_samples_never_repeat_a_pair() {
        let t = track(&[
            (0, 80.0, 10.0),
            (10, 80.0, 10.0),
            (20, 80.001, 10.0),
            (30, 80.001, 10.0),
            (40, 80.001, 10.0),
            (50, 80.002, 10.002),
        ]);
        let kept = t.apply_mask(&PositionValidator::new(true).validate(&t));
        for pair in kept.samples().windows(2) {
            assert!(!pair[0].coordinate.same_pair(&pair[1].coordinate));
        }
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_duplicate_timestamp_is_flagged() {
        let t = track(&[(0, 80.0, 10.0), (0, 80.1, 10.0), (60, 80.2, 10.0)]);
        let validator = PositionValidator::new(true);
        assert_eq!(
            validator.classify(&t),
            vec![None, Some(PositionFlag::DuplicateTimestamp), None]
        );
    }

    #[test]
    fn test_speed_check_only_without_pairs_only() {
        // 1 degree of latitude in one hour is about 31 m/s
        let t = track(&[(0, 80.0, 10.0), (60, 81.0, 10.0), (120, 80.001, 10.0)]);

        let strict = PositionValidator::new(true).validate(&t);
        assert_eq!(strict.flagged_count(), 0);

        let broad = PositionValidator::new(false).with_max_speed(1.5).classify(&t);
        assert_eq!(
            broad,
            vec![None, Some(PositionFlag::ExcessiveSpeed), None]
        );
    }

    #[test]
    fn test_bad_first_fix_does_not_condemn_the_track() {
        // first fix lands 70 degrees away from a slow drift at 80N
        let mut points = vec![(0, 10.0, 10.0)];
        points.extend((1..20).map(|h| (h * 60, 80.0 + h as f64 * 0.001, 10.0)));
        let t = track(&points);

        let flags = PositionValidator::new(false).with_max_speed(1.5).classify(&t);

        assert_eq!(flags[0], Some(PositionFlag::ExcessiveSpeed));
        assert!(flags[1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_two_sample_track_with_fast_jump_keeps_first() {
        let t = track(&[(0, 80.0, 10.0), (60, 81.0, 10.0)]);
        let flags = PositionValidator::new(false).with_max_speed(1.5).classify(&t);
        assert_eq!(flags, vec![None, Some(PositionFlag::ExcessiveSpeed)]);
    }

    #[test]
    fn test_speed_check_across_antimeridian() {
        // 0.02 degrees of longitude at 80N in an hour is well under 1 m/s
        let t = track(&[(0, 80.0, 179.99), (60, 80.0, -179.99)]);
        let mask = PositionValidator::new(false).with_max_speed(1.5).validate(&t);
        assert_eq!(mask.flagged_count(), 0);
    }
}
