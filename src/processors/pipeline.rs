use std::fmt;

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::{PointOrigin, ResampledTrack, Track, VelocitySample};
use crate::processors::{GapSegmenter, PositionValidator, TrackInterpolator, VelocityComputer};

/// How far a track got through the pipeline. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    Raw,
    Validated,
    Segmented,
    Interpolated,
    VelocityDerived,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Raw => "raw",
            PipelineStage::Validated => "validated",
            PipelineStage::Segmented => "segmented",
            PipelineStage::Interpolated => "interpolated",
            PipelineStage::VelocityDerived => "velocity-derived",
        };
        f.write_str(name)
    }
}

/// Per-track counts collected while the pipeline runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackReport {
    pub buoy_id: String,
    pub stage: PipelineStage,
    pub raw_samples: usize,
    pub position_flags: usize,
    pub segments: usize,
    pub retained_segments: usize,
    pub gap_flags: usize,
    pub retained_samples: usize,
    pub grid_points: usize,
    pub interpolated_points: usize,
    pub missing_points: usize,
    pub velocity_samples: usize,
    pub rejected_pairs: usize,
}

impl TrackReport {
    fn new(track: &Track) -> Self {
        Self {
            buoy_id: track.buoy_id.clone(),
            stage: PipelineStage::Raw,
            raw_samples: track.len(),
            position_flags: 0,
            segments: 0,
            retained_segments: 0,
            gap_flags: 0,
            retained_samples: 0,
            grid_points: 0,
            interpolated_points: 0,
            missing_points: 0,
            velocity_samples: 0,
            rejected_pairs: 0,
        }
    }

    /// The track ran out of samples before velocity could be derived.
    pub fn is_skipped(&self) -> bool {
        self.stage < PipelineStage::VelocityDerived && self.retained_samples == 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} raw, {} position flags, {} gap flags ({}/{} segments kept), {} retained, {} grid points ({} interpolated, {} missing), {} velocity samples, {} rejected pairs [{}]",
            self.buoy_id,
            self.raw_samples,
            self.position_flags,
            self.gap_flags,
            self.retained_segments,
            self.segments,
            self.retained_samples,
            self.grid_points,
            self.interpolated_points,
            self.missing_points,
            self.velocity_samples,
            self.rejected_pairs,
            self.stage
        )
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Track after position validation and gap segmentation.
    pub cleaned: Track,
    pub resampled: Option<ResampledTrack>,
    pub velocity: Vec<VelocitySample>,
    pub report: TrackReport,
}

/// Drives one track through validation, segmentation, interpolation and
/// velocity derivation.
pub struct TrackPipeline {
    config: PipelineConfig,
}

impl TrackPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validation and segmentation only.
    pub fn clean(&self, track: &Track) -> (Track, TrackReport) {
        let mut report = TrackReport::new(track);

        let validator =
            PositionValidator::new(self.config.pairs_only).with_max_speed(self.config.max_speed_mps);
        let position_mask = validator.validate(track);
        let validated = track.apply_mask(&position_mask);
        report.position_flags = position_mask.flagged_count();
        report.stage = PipelineStage::Validated;

        if validated.is_empty() {
            info!(buoy = %track.buoy_id, "no samples left after position validation, skipping");
            return (validated, report);
        }

        let segmenter = GapSegmenter::new(self.config.threshold_gap, self.config.threshold_segment);
        let segments = segmenter.segments(&validated);
        let gap_mask = segmenter.segment(&validated);
        let segmented = validated.apply_mask(&gap_mask);

        report.segments = segments.len();
        report.retained_segments = segments.iter().filter(|s| s.retained).count();
        report.gap_flags = gap_mask.flagged_count();
        report.retained_samples = segmented.len();
        report.stage = PipelineStage::Segmented;

        if segmented.is_empty() {
            info!(
                buoy = %track.buoy_id,
                segments = report.segments,
                threshold_segment = self.config.threshold_segment,
                "no segment long enough, skipping"
            );
        }

        (segmented, report)
    }

    /// Full run through to the velocity series.
    pub fn run(&self, track: &Track) -> Result<PipelineOutput> {
        let (cleaned, mut report) = self.clean(track);

        if cleaned.is_empty() {
            return Ok(PipelineOutput {
                cleaned,
                resampled: None,
                velocity: Vec::new(),
                report,
            });
        }

        let computer = VelocityComputer::new();

        let (resampled, derived) = if self.config.interpolate {
            let interpolator =
                TrackInterpolator::with_maxgap(self.config.freq, self.config.effective_maxgap());
            let resampled = interpolator.interpolate(&cleaned)?;

            report.grid_points = resampled.len();
            report.interpolated_points = resampled.count(PointOrigin::Interpolated);
            report.missing_points = resampled.count(PointOrigin::Missing);
            report.stage = PipelineStage::Interpolated;

            let derived = computer.compute(&resampled, &cleaned.buoy_id);
            (Some(resampled), derived)
        } else {
            // neighbours from different segments are more than threshold_gap apart
            let computer = computer.with_max_gap(self.config.threshold_gap);
            (None, computer.compute(&cleaned, &cleaned.buoy_id))
        };

        report.velocity_samples = derived.samples.len();
        report.rejected_pairs = derived.rejected_pairs;
        report.stage = PipelineStage::VelocityDerived;

        debug!(report = %report.summary(), "pipeline complete");

        Ok(PipelineOutput {
            cleaned,
            resampled,
            velocity: derived.samples,
            report,
        })
    }
}
