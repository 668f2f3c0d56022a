use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::Validate;

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_FREQ, DEFAULT_MAXGAP_MINUTES, DEFAULT_MAX_SPEED_MPS, DEFAULT_PAIRS_ONLY,
    DEFAULT_THRESHOLD_GAP, DEFAULT_THRESHOLD_SEGMENT, ENV_PREFIX,
};
use crate::utils::duration::{format_duration, serde_text};

/// Parameters of the cleaning and velocity pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest time gap allowed inside a segment.
    #[serde(with = "serde_text")]
    pub threshold_gap: Duration,

    /// Smallest number of samples a segment needs to be kept.
    #[validate(range(min = 1))]
    pub threshold_segment: usize,

    /// Spacing of the resampling grid.
    #[serde(with = "serde_text")]
    pub freq: Duration,

    /// Largest original gap that may be bridged by interpolation.
    #[validate(range(min = 0))]
    pub maxgap_minutes: i64,

    /// Only flag exact duplicate position pairs.
    pub pairs_only: bool,

    /// Implied speed above which a position is flagged when `pairs_only` is off.
    #[validate(range(min = 0.0))]
    pub max_speed_mps: f64,

    /// Resample onto the `freq` grid before deriving velocity.
    pub interpolate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold_gap: Duration::hours(4),
            threshold_segment: DEFAULT_THRESHOLD_SEGMENT,
            freq: Duration::hours(1),
            maxgap_minutes: DEFAULT_MAXGAP_MINUTES,
            pairs_only: DEFAULT_PAIRS_ONLY,
            max_speed_mps: DEFAULT_MAX_SPEED_MPS,
            interpolate: true,
        }
    }
}

impl PipelineConfig {
    /// Layer an optional config file and `ICEDRIFT_*` environment variables
    /// over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("threshold_gap", DEFAULT_THRESHOLD_GAP)?
            .set_default("threshold_segment", DEFAULT_THRESHOLD_SEGMENT as i64)?
            .set_default("freq", DEFAULT_FREQ)?
            .set_default("maxgap_minutes", DEFAULT_MAXGAP_MINUTES)?
            .set_default("pairs_only", DEFAULT_PAIRS_ONLY)?
            .set_default("max_speed_mps", DEFAULT_MAX_SPEED_MPS)?
            .set_default("interpolate", true)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Validate ranges and the duration fields the derive cannot express.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if self.threshold_gap <= Duration::zero() {
            return Err(ProcessingError::Config(format!(
                "threshold_gap must be positive, got {}",
                format_duration(&self.threshold_gap)
            )));
        }

        if self.freq <= Duration::zero() {
            return Err(ProcessingError::Config(format!(
                "freq must be positive, got {}",
                format_duration(&self.freq)
            )));
        }

        if Duration::try_minutes(self.maxgap_minutes).is_none() {
            return Err(ProcessingError::Config(format!(
                "maxgap_minutes {} is out of range",
                self.maxgap_minutes
            )));
        }

        Ok(())
    }

    /// `maxgap_minutes` as a duration, saturating when out of range.
    pub fn maxgap(&self) -> Duration {
        Duration::try_minutes(self.maxgap_minutes).unwrap_or(Duration::MAX)
    }

    /// Interpolation gap limit, never wider than `threshold_gap`.
    ///
    /// Adjacent samples of different segments are always more than
    /// `threshold_gap` apart, so with this cap an interpolated point can not
    /// join two segments.
    pub fn effective_maxgap(&self) -> Duration {
        let maxgap = self.maxgap();
        if maxgap > self.threshold_gap {
            warn!(
                maxgap_minutes = self.maxgap_minutes,
                threshold_gap = %format_duration(&self.threshold_gap),
                "maxgap exceeds threshold_gap; clamping interpolation gap to threshold_gap"
            );
            self.threshold_gap
        } else {
            maxgap
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "threshold_gap={}, threshold_segment={}, freq={}, maxgap={}min, pairs_only={}, max_speed={} m/s, interpolate={}",
            format_duration(&self.threshold_gap),
            self.threshold_segment,
            format_duration(&self.freq),
            self.maxgap_minutes,
            self.pairs_only,
            self.max_speed_mps,
            self.interpolate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults_match_buoy_processing() {
        let config = PipelineConfig::default();
        assert_eq!(config.threshold_gap, Duration::hours(4));
        assert_eq!(config.threshold_segment, 12);
        assert_eq!(config.freq, Duration::hours(1));
        assert_eq!(config.maxgap_minutes, 240);
        assert!(config.pairs_only);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "threshold_gap = \"6 hours\"").unwrap();
        writeln!(file, "threshold_segment = 24").unwrap();
        writeln!(file, "freq = \"30min\"").unwrap();
        writeln!(file, "pairs_only = false").unwrap();

        let config = PipelineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.threshold_gap, Duration::hours(6));
        assert_eq!(config.threshold_segment, 24);
        assert_eq!(config.freq, Duration::minutes(30));
        assert!(!config.pairs_only);
        assert_eq!(config.maxgap_minutes, 240);
    }

    #[test]
    fn test_check_rejects_bad_values() {
        let config = PipelineConfig {
            threshold_segment: 0,
            ..PipelineConfig::default()
        };
        assert!(config.check().is_err());

        let config = PipelineConfig {
            freq: Duration::zero(),
            ..PipelineConfig::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_effective_maxgap_is_capped() {
        let config = PipelineConfig {
            maxgap_minutes: 600,
            ..PipelineConfig::default()
        };
        assert_eq!(config.effective_maxgap(), Duration::hours(4));

        let config = PipelineConfig {
            maxgap_minutes: 90,
            ..PipelineConfig::default()
        };
        assert_eq!(config.effective_maxgap(), Duration::minutes(90));
    }

    #[test]
    fn test_huge_maxgap_is_rejected_without_panicking() {
        let config = PipelineConfig {
            maxgap_minutes: i64::MAX,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.check(), Err(ProcessingError::Config(_))));
        assert_eq!(config.effective_maxgap(), Duration::hours(4));
    }
}
