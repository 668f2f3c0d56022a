use chrono::Duration;
use tracing::debug;

use crate::models::{BooleanMask, Track};

/// A maximal run of samples with no gap above the threshold.
///
/// `start..end` indexes into the segmented track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub retained: bool,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Splits a track at long data outages and drops fragments that are too short.
pub struct GapSegmenter {
    threshold_gap: Duration,
    threshold_segment: usize,
}

impl GapSegmenter {
    pub fn new(threshold_gap: Duration, threshold_segment: usize) -> Self {
        Self {
            threshold_gap,
            threshold_segment,
        }
    }

    /// Runs of the track in time order. A gap equal to the threshold does not split.
    pub fn segments(&self, track: &Track) -> Vec<Segment> {
        let samples = track.samples();
        if samples.is_empty() {
            return Vec::new();
        }

        let mut segments = Vec::new();
        let mut start = 0;
        for i in 1..samples.len() {
            if samples[i].timestamp - samples[i - 1].timestamp > self.threshold_gap {
                segments.push(self.close(start, i));
                start = i;
            }
        }
        segments.push(self.close(start, samples.len()));

        segments
    }

    /// Drop mask flagging every sample of every undersized segment.
    pub fn segment(&self, track: &Track) -> BooleanMask {
        let segments = self.segments(track);
        let mut mask = BooleanMask::all_false(track.len());

        for segment in segments.iter().filter(|s| !s.retained) {
            for i in segment.start..segment.end {
                mask.flag(i);
            }
        }

        debug!(
            buoy = %track.buoy_id,
            segments = segments.len(),
            retained_segments = segments.iter().filter(|s| s.retained).count(),
            dropped_samples = mask.flagged_count(),
            "gap segmentation complete"
        );

        mask
    }

    fn close(&self, start: usize, end: usize) -> Segment {
        Segment {
            start,
            end,
            retained: end - start >= self.threshold_segment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PositionSample;
    use chrono::{TimeZone, Utc};

    fn hourly_track(hours: &[i64]) -> Track {
        let t0 = Utc.with_ymd_and_hms(2015, 2, 1, 0, 0, 0).unwrap();
        Track::new(
            "nice",
            hours
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    PositionSample::new(t0 + Duration::hours(*h), 82.0 + i as f64 * 0.01, 20.0)
                })
                .collect(),
        )
    }

    #[test]
    fn test_five_hour_gap_splits_into_two() {
        // 0..=5, then 10..=12
        let track = hourly_track(&[0, 1, 2, 3, 4, 5, 10, 11, 12]);
        let segmenter = GapSegmenter::new(Duration::hours(4), 4);
        let segments = segmenter.segments(&track);

        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].start, segments[0].end), (0, 6));
        assert_eq!((segments[1].start, segments[1].end), (6, 9));
        assert!(segments[0].retained);
        assert!(!segments[1].retained);

        let mask = segmenter.segment(&track);
        assert_eq!(mask.flagged_count(), 3);
        assert!(mask.as_slice().iter().skip(6).all(|f| *f));
    }

    #[test]
    fn test_gap_equal_to_threshold_does_not_split() {
        let track = hourly_track(&[0, 4, 8, 12]);
        let segments = GapSegmenter::new(Duration::hours(4), 1).segments(&track);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), 4);
    }

    #[test]
    fn test_short_interior_segment_is_dropped_entirely() {
        let track = hourly_track(&[0, 1, 2, 10, 11, 20, 21, 22]);
        let mask = GapSegmenter::new(Duration::hours(4), 3).segment(&track);
        assert_eq!(
            mask.as_slice(),
            &[false, false, false, true, true, false, false, false]
        );
    }

    #[test]
    fn test_empty_track() {
        let track = hourly_track(&[]);
        let segmenter = GapSegmenter::new(Duration::hours(4), 12);
        assert!(segmenter.segments(&track).is_empty());
        assert!(segmenter.segment(&track).is_empty());
    }
}
