use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use csv::{ReaderBuilder, Writer, WriterBuilder};

use crate::error::{ProcessingError, Result};
use crate::models::{ResampledTrack, Track, VelocitySample};
use crate::utils::constants::{
    DATETIME_COLUMN, DEFAULT_BUFFER_SIZE, LATITUDE_COLUMN, LONGITUDE_COLUMN, ORIGIN_COLUMN,
    VELOCITY_COLUMNS,
};
use crate::utils::timestamps::{format_timestamp, parse_timestamp};

/// Writes tracks and velocity series as CSV.
pub struct CsvWriter {
    precision: usize,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { precision: 6 }
    }

    /// Decimal places for resampled coordinates, speeds and bearings.
    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Cleaned track: `datetime, latitude, longitude` then the passthrough columns.
    ///
    /// Coordinates are written in shortest round-trip form so no input
    /// precision is lost.
    pub fn write_track(&self, track: &Track, path: &Path) -> Result<()> {
        let mut writer = self.create(path)?;

        let mut header = vec![DATETIME_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN];
        header.extend(track.passthrough_columns.iter().map(String::as_str));
        writer.write_record(&header)?;

        for sample in track.samples() {
            let mut row = vec![
                format_timestamp(&sample.timestamp),
                sample.latitude().to_string(),
                sample.longitude().to_string(),
            ];
            row.extend(sample.passthrough.iter().cloned());
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Resampled track; missing grid points have empty coordinates.
    pub fn write_resampled(&self, track: &ResampledTrack, path: &Path) -> Result<()> {
        let mut writer = self.create(path)?;
        writer.write_record([DATETIME_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN, ORIGIN_COLUMN])?;

        for point in track.points() {
            let (lat, lon) = match point.coordinate {
                Some(c) => (self.number(c.latitude), self.number(c.longitude)),
                None => (String::new(), String::new()),
            };
            writer.write_record([
                format_timestamp(&point.timestamp),
                lat,
                lon,
                point.origin.as_str().to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_velocity(&self, samples: &[VelocitySample], path: &Path) -> Result<()> {
        let mut writer = self.create(path)?;
        writer.write_record(VELOCITY_COLUMNS)?;

        for sample in samples {
            writer.write_record([
                format_timestamp(&sample.date),
                self.number(sample.speed),
                self.number(sample.bearing),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Read back a velocity CSV written by `write_velocity`.
    pub fn read_velocity(&self, path: &Path) -> Result<Vec<VelocitySample>> {
        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file));

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| ProcessingError::MissingColumn {
                    column: name.to_string(),
                    file: path.display().to_string(),
                })
        };
        let (date_idx, speed_idx, bearing_idx) = (
            column(VELOCITY_COLUMNS[0])?,
            column(VELOCITY_COLUMNS[1])?,
            column(VELOCITY_COLUMNS[2])?,
        );

        let mut samples = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or("");
            let number = |i: usize| {
                field(i).parse::<f64>().map_err(|_| {
                    ProcessingError::InvalidFormat(format!(
                        "{} line {}: '{}' is not a number",
                        path.display(),
                        line + 2,
                        field(i)
                    ))
                })
            };

            samples.push(VelocitySample::new(
                parse_timestamp(field(date_idx))?,
                number(speed_idx)?,
                number(bearing_idx)?,
            ));
        }

        Ok(samples)
    }

    fn create(&self, path: &Path) -> Result<Writer<BufWriter<File>>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, File::create(path)?);
        Ok(WriterBuilder::new().from_writer(file))
    }

    fn number(&self, value: f64) -> String {
        format!("{:.*}", self.precision, value)
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
