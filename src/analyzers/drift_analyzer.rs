use crate::error::{ProcessingError, Result};
use crate::models::VelocitySample;
use crate::utils::constants::DEFAULT_MAX_SPEED_MPS;
use crate::writers::{CsvWriter, ParquetWriter};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct DriftStatistics {
    pub samples: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub speed: SpeedStats,
    /// Circular mean of the bearings; `None` when they cancel out.
    pub mean_bearing: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeedStats {
    pub mean: f64,
    pub median: f64,
    pub max: f64,
    pub max_at: DateTime<Utc>,
    pub threshold: f64,
    pub above_threshold: usize,
}

impl SpeedStats {
    pub fn above_threshold_percentage(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        (self.above_threshold as f64 / total as f64) * 100.0
    }
}

pub struct DriftAnalyzer {
    speed_threshold: f64,
}

impl DriftAnalyzer {
    pub fn new() -> Self {
        Self {
            speed_threshold: DEFAULT_MAX_SPEED_MPS,
        }
    }

    /// Speed above which samples are counted as suspect, in m/s.
    pub fn with_speed_threshold(mut self, threshold: f64) -> Self {
        self.speed_threshold = threshold;
        self
    }

    /// Statistics of a velocity file; `.parquet` files are read as Parquet,
    /// anything else as CSV.
    pub fn analyze_file(&self, path: &Path) -> Result<DriftStatistics> {
        let is_parquet = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("parquet"))
            .unwrap_or(false);

        let samples = if is_parquet {
            ParquetWriter::new().read_velocity(path)?
        } else {
            CsvWriter::new().read_velocity(path)?
        };

        self.analyze(&samples)
    }

    pub fn analyze(&self, samples: &[VelocitySample]) -> Result<DriftStatistics> {
        let first = samples
            .first()
            .ok_or_else(|| ProcessingError::InvalidInput("No velocity samples to analyze".to_string()))?;

        let mut start = first.date;
        let mut end = first.date;
        let mut max = first.speed;
        let mut max_at = first.date;
        let mut speed_sum = 0.0;
        let mut above_threshold = 0;
        let (mut sin_sum, mut cos_sum) = (0.0f64, 0.0f64);

        for sample in samples {
            start = start.min(sample.date);
            end = end.max(sample.date);

            if sample.speed > max {
                max = sample.speed;
                max_at = sample.date;
            }
            speed_sum += sample.speed;
            if sample.speed > self.speed_threshold {
                above_threshold += 1;
            }

            let theta = sample.bearing.to_radians();
            sin_sum += theta.sin();
            cos_sum += theta.cos();
        }

        let mut speeds: Vec<f64> = samples.iter().map(|s| s.speed).collect();
        speeds.sort_by(|a, b| a.total_cmp(b));
        let mid = speeds.len() / 2;
        let median = if speeds.len() % 2 == 0 {
            (speeds[mid - 1] + speeds[mid]) / 2.0
        } else {
            speeds[mid]
        };

        let n = samples.len() as f64;
        let resultant = (sin_sum / n).hypot(cos_sum / n);
        let mean_bearing = if resultant < 1e-9 {
            None
        } else {
            let degrees = sin_sum.atan2(cos_sum).to_degrees().rem_euclid(360.0);
            Some(if degrees >= 360.0 { 0.0 } else { degrees })
        };

        Ok(DriftStatistics {
            samples: samples.len(),
            start,
            end,
            speed: SpeedStats {
                mean: speed_sum / n,
                median,
                max,
                max_at,
                threshold: self.speed_threshold,
                above_threshold,
            },
            mean_bearing,
        })
    }
}

impl Default for DriftAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DriftStatistics {
    pub fn summary(&self) -> String {
        let span = self.end.signed_duration_since(self.start);
        format!(
            "Velocity Samples: {}\n\
            Time Span: {} to {} ({:.1} days)\n\
            Speed: mean {:.3} m/s, median {:.3} m/s, max {:.3} m/s",
            self.samples,
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M"),
            span.num_minutes() as f64 / 1440.0,
            self.speed.mean,
            self.speed.median,
            self.speed.max
        )
    }

    pub fn detailed_summary(&self) -> String {
        let bearing = match self.mean_bearing {
            Some(b) => format!("{:.1}°", b),
            None => "undefined (bearings cancel out)".to_string(),
        };

        format!(
            "{}\n\n\
            Drift Details:\n\
            - Fastest drift: {:.3} m/s at {}\n\
            - Above {:.2} m/s: {} samples ({:.1}%)\n\
            - Mean bearing: {}",
            self.summary(),
            self.speed.max,
            self.speed.max_at.format("%Y-%m-%d %H:%M"),
            self.speed.threshold,
            self.speed.above_threshold,
            self.speed.above_threshold_percentage(self.samples),
            bearing
        )
    }
}
