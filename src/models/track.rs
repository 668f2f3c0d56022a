use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BooleanMask, Coordinate, PositionSample};

/// Time-ordered position samples for a single buoy.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub buoy_id: String,
    /// Names of the passthrough columns, in input order.
    pub passthrough_columns: Vec<String>,
    samples: Vec<PositionSample>,
}

impl Track {
    /// Build a track; samples are stably sorted by timestamp.
    pub fn new(buoy_id: impl Into<String>, mut samples: Vec<PositionSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self {
            buoy_id: buoy_id.into(),
            passthrough_columns: Vec::new(),
            samples,
        }
    }

    pub fn with_passthrough_columns(mut self, columns: Vec<String>) -> Self {
        self.passthrough_columns = columns;
        self
    }

    pub fn samples(&self) -> &[PositionSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.first().map(|s| s.timestamp)
    }

    /// New track keeping only the samples the mask does not flag.
    pub fn apply_mask(&self, mask: &BooleanMask) -> Track {
        let samples = self
            .samples
            .iter()
            .enumerate()
            .filter(|(i, _)| !mask.is_flagged(*i))
            .map(|(_, s)| s.clone())
            .collect();

        Track {
            buoy_id: self.buoy_id.clone(),
            passthrough_columns: self.passthrough_columns.clone(),
            samples,
        }
    }
}

/// How a grid point got its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointOrigin {
    Observed,
    Interpolated,
    /// Mean of the samples falling in the grid cell.
    Averaged,
    Missing,
}

impl PointOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointOrigin::Observed => "observed",
            PointOrigin::Interpolated => "interpolated",
            PointOrigin::Averaged => "averaged",
            PointOrigin::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub timestamp: DateTime<Utc>,
    pub coordinate: Option<Coordinate>,
    pub origin: PointOrigin,
}

impl GridPoint {
    pub fn observed(timestamp: DateTime<Utc>, coordinate: Coordinate) -> Self {
        Self {
            timestamp,
            coordinate: Some(coordinate),
            origin: PointOrigin::Observed,
        }
    }

    pub fn interpolated(timestamp: DateTime<Utc>, coordinate: Coordinate) -> Self {
        Self {
            timestamp,
            coordinate: Some(coordinate),
            origin: PointOrigin::Interpolated,
        }
    }

    pub fn averaged(timestamp: DateTime<Utc>, coordinate: Coordinate) -> Self {
        Self {
            timestamp,
            coordinate: Some(coordinate),
            origin: PointOrigin::Averaged,
        }
    }

    pub fn missing(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            coordinate: None,
            origin: PointOrigin::Missing,
        }
    }
}

/// A track on a fixed-frequency time grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledTrack {
    pub buoy_id: String,
    pub freq: chrono::Duration,
    points: Vec<GridPoint>,
}

impl ResampledTrack {
    pub fn new(buoy_id: impl Into<String>, freq: chrono::Duration, points: Vec<GridPoint>) -> Self {
        Self {
            buoy_id: buoy_id.into(),
            freq,
            points,
        }
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn count(&self, origin: PointOrigin) -> usize {
        self.points.iter().filter(|p| p.origin == origin).count()
    }
}

/// Anything that can be read as a sequence of timed, possibly absent positions.
pub trait TimedPositions {
    fn position_count(&self) -> usize;

    fn position_at(&self, index: usize) -> (DateTime<Utc>, Option<Coordinate>);
}

impl TimedPositions for Track {
    fn position_count(&self) -> usize {
        self.samples.len()
    }

    fn position_at(&self, index: usize) -> (DateTime<Utc>, Option<Coordinate>) {
        let s = &self.samples[index];
        (s.timestamp, Some(s.coordinate))
    }
}

impl TimedPositions for ResampledTrack {
    fn position_count(&self) -> usize {
        self.points.len()
    }

    fn position_at(&self, index: usize) -> (DateTime<Utc>, Option<Coordinate>) {
        let p = &self.points[index];
        (p.timestamp, p.coordinate)
    }
}
