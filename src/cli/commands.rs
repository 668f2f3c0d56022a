use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, Level};

use crate::analyzers::DriftAnalyzer;
use crate::cli::args::{Cli, Commands, InputArgs, OutputFormat, ResampleMethod};
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::PointOrigin;
use crate::processors::{
    find_track_files, BatchProcessor, BatchReport, PipelineStage, TrackInterpolator, TrackPipeline,
};
use crate::readers::TrackReader;
use crate::utils::filename::{cleaned_track_path, resampled_track_path, velocity_path};
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvWriter, ParquetWriter};

pub async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let base_config = PipelineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Clean { input, pipeline } => {
            let config = pipeline.apply(base_config)?;
            print_header("Cleaning buoy tracks...", &input, &config);

            let report = tokio::task::spawn_blocking(move || clean_tracks(&input, config)).await??;
            println!("\n{}", report.generate_summary());
        }

        Commands::Velocity {
            input,
            pipeline,
            format,
            compression,
        } => {
            let config = pipeline.apply(base_config)?;
            print_header("Deriving drift velocity...", &input, &config);

            let report = tokio::task::spawn_blocking(move || {
                velocity_tracks(&input, config, format, &compression)
            })
            .await??;
            println!("\n{}", report.generate_summary());
        }

        Commands::Resample {
            input,
            pipeline,
            method,
        } => {
            let config = pipeline.apply(base_config)?;
            print_header("Resampling buoy tracks...", &input, &config);

            let report =
                tokio::task::spawn_blocking(move || resample_tracks(&input, config, method)).await??;
            println!("\n{}", report.generate_summary());
        }

        Commands::Summary {
            file,
            threshold,
            json,
        } => {
            let stats = {
                let file = file.clone();
                tokio::task::spawn_blocking(move || {
                    DriftAnalyzer::new()
                        .with_speed_threshold(threshold)
                        .analyze_file(&file)
                })
                .await??
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Analyzing velocity file: {}", file.display());
                println!("\n{}", stats.detailed_summary());

                let is_parquet = file
                    .extension()
                    .map(|e| e.eq_ignore_ascii_case("parquet"))
                    .unwrap_or(false);
                if is_parquet {
                    let file_info = ParquetWriter::new().get_file_info(&file)?;
                    println!("\nFile Details:");
                    println!("{}", file_info.summary());
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    result.map_err(|e| ProcessingError::Config(format!("Failed to initialise logging: {}", e)))
}

fn print_header(title: &str, input: &InputArgs, config: &PipelineConfig) {
    println!("{}", title);
    println!("Input: {}", input.input.display());
    if let Some(ref dir) = input.output_dir {
        println!("Output directory: {}", dir.display());
    }
    println!("Workers: {}", input.max_workers);
    println!("Parameters: {}", config.summary());
}

/// A single file, or every CSV file directly inside a directory.
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_dir() {
        let files = find_track_files(input)?;
        if files.is_empty() {
            return Err(ProcessingError::InvalidInput(format!(
                "No .csv track files found in {}",
                input.display()
            )));
        }
        Ok(files)
    } else if input.is_file() {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(ProcessingError::InvalidInput(format!(
            "Input {} does not exist",
            input.display()
        )))
    }
}

fn batch_processor(input: &InputArgs) -> BatchProcessor {
    let reader = TrackReader::new(input.schema).with_mmap(input.mmap);
    BatchProcessor::new(input.max_workers.max(1), reader)
}

fn clean_tracks(input: &InputArgs, config: PipelineConfig) -> Result<BatchReport> {
    let paths = collect_inputs(&input.input)?;
    let progress = ProgressReporter::new(paths.len() as u64, "Cleaning tracks...", false);

    let pipeline = TrackPipeline::new(config);
    let writer = CsvWriter::new();
    let output_dir = input.output_dir.as_deref();

    let report = batch_processor(input).process_files(&paths, Some(&progress), |path, track| {
        let (cleaned, report) = pipeline.clean(track);
        if !cleaned.is_empty() {
            let out = cleaned_track_path(path, output_dir);
            writer.write_track(&cleaned, &out)?;
            info!(buoy = %track.buoy_id, path = %out.display(), "cleaned track written");
        }
        Ok(report)
    })?;

    progress.finish_with_message(&format!("Cleaned {} tracks", report.succeeded()));
    Ok(report)
}

fn velocity_tracks(
    input: &InputArgs,
    config: PipelineConfig,
    format: OutputFormat,
    compression: &str,
) -> Result<BatchReport> {
    let paths = collect_inputs(&input.input)?;
    let progress = ProgressReporter::new(paths.len() as u64, "Deriving velocity...", false);

    let pipeline = TrackPipeline::new(config);
    let csv_writer = CsvWriter::new();
    let parquet_writer = ParquetWriter::new().with_compression(compression)?;
    let output_dir = input.output_dir.as_deref();

    let report = batch_processor(input).process_files(&paths, Some(&progress), |path, track| {
        let output = pipeline.run(track)?;
        if !output.report.is_skipped() {
            let out = velocity_path(path, output_dir, format.extension());
            match format {
                OutputFormat::Csv => csv_writer.write_velocity(&output.velocity, &out)?,
                OutputFormat::Parquet => parquet_writer.write_velocity(&output.velocity, &out)?,
            }
            info!(
                buoy = %track.buoy_id,
                samples = output.velocity.len(),
                path = %out.display(),
                "velocity written"
            );
        }
        Ok(output.report)
    })?;

    progress.finish_with_message(&format!(
        "Derived velocity for {} tracks",
        report.succeeded()
    ));
    Ok(report)
}

fn resample_tracks(
    input: &InputArgs,
    config: PipelineConfig,
    method: ResampleMethod,
) -> Result<BatchReport> {
    let paths = collect_inputs(&input.input)?;
    let progress = ProgressReporter::new(paths.len() as u64, "Resampling tracks...", false);

    let interpolator = TrackInterpolator::with_maxgap(config.freq, config.effective_maxgap());
    let pipeline = TrackPipeline::new(config);
    let writer = CsvWriter::new();
    let output_dir = input.output_dir.as_deref();

    let report = batch_processor(input).process_files(&paths, Some(&progress), |path, track| {
        let (cleaned, mut report) = pipeline.clean(track);
        if cleaned.is_empty() {
            return Ok(report);
        }

        let resampled = match method {
            ResampleMethod::Linear => interpolator.interpolate(&cleaned)?,
            ResampleMethod::Mean => interpolator.bin_average(&cleaned)?,
        };
        report.grid_points = resampled.len();
        report.interpolated_points = resampled.count(PointOrigin::Interpolated);
        report.missing_points = resampled.count(PointOrigin::Missing);
        report.stage = PipelineStage::Interpolated;

        let out = resampled_track_path(path, output_dir);
        writer.write_resampled(&resampled, &out)?;
        info!(buoy = %track.buoy_id, points = resampled.len(), path = %out.display(), "resampled track written");

        Ok(report)
    })?;

    progress.finish_with_message(&format!("Resampled {} tracks", report.succeeded()));
    Ok(report)
}
