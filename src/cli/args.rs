use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::readers::InputSchema;
use crate::utils::constants::COMPRESSION_SNAPPY;
use crate::utils::duration::parse_duration;

#[derive(Parser)]
#[command(name = "icedrift")]
#[command(about = "Sea-ice buoy track cleaning and drift velocity processor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "TOML file with pipeline parameters")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate positions and drop short segments, writing cleaned tracks
    Clean {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Run the full pipeline and write drift velocity series
    Velocity {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        #[arg(short, long, default_value = COMPRESSION_SNAPPY, help = "Parquet compression")]
        compression: String,
    },

    /// Clean and resample tracks onto a regular time grid
    Resample {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        pipeline: PipelineArgs,

        #[arg(short, long, value_enum, default_value = "linear")]
        method: ResampleMethod,
    },

    /// Display drift statistics of a velocity file
    Summary {
        #[arg(short, long, help = "Velocity file (.csv or .parquet)")]
        file: PathBuf,

        #[arg(long, default_value = "1.5", help = "Speed threshold in m/s")]
        threshold: f64,

        #[arg(long, help = "Print statistics as JSON")]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[arg(short, long, help = "Track file or directory of track files")]
    pub input: PathBuf,

    #[arg(
        short,
        long,
        help = "Output directory [default: cleaned_data/, velocity/ or resampled/ next to the input]"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "auto")]
    pub schema: InputSchema,

    #[arg(long, help = "Memory-map input files")]
    pub mmap: bool,

    #[arg(long, default_value_t = num_cpus::get())]
    pub max_workers: usize,
}

/// Command-line overrides of the pipeline configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[arg(long, help = "Gap that splits a track into segments, e.g. 4h or 240min")]
    pub threshold_gap: Option<String>,

    #[arg(long, help = "Minimum samples per segment")]
    pub threshold_segment: Option<usize>,

    #[arg(long, help = "Resampling frequency, e.g. 1h or 30min")]
    pub freq: Option<String>,

    #[arg(long, help = "Largest gap bridged by interpolation, in minutes")]
    pub maxgap_minutes: Option<i64>,

    #[arg(long, help = "Also flag positions implying excessive drift speed")]
    pub check_speed: bool,

    #[arg(long, help = "Speed limit for --check-speed, in m/s")]
    pub max_speed: Option<f64>,

    #[arg(long, help = "Derive velocity from the cleaned track without resampling")]
    pub no_interpolate: bool,
}

impl PipelineArgs {
    pub fn apply(&self, mut config: PipelineConfig) -> Result<PipelineConfig> {
        if let Some(ref gap) = self.threshold_gap {
            config.threshold_gap = parse_duration(gap)?;
        }
        if let Some(segment) = self.threshold_segment {
            config.threshold_segment = segment;
        }
        if let Some(ref freq) = self.freq {
            config.freq = parse_duration(freq)?;
        }
        if let Some(maxgap) = self.maxgap_minutes {
            config.maxgap_minutes = maxgap;
        }
        if self.check_speed {
            config.pairs_only = false;
        }
        if let Some(speed) = self.max_speed {
            config.max_speed_mps = speed;
        }
        if self.no_interpolate {
            config.interpolate = false;
        }

        config.check()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResampleMethod {
    /// Linear interpolation onto the grid
    Linear,
    /// Mean position per grid cell
    Mean,
}
