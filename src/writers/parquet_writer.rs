use crate::error::{ProcessingError, Result};
use crate::models::VelocitySample;
use crate::utils::constants::{
    COMPRESSION_NONE, COMPRESSION_SNAPPY, DEFAULT_ROW_GROUP_SIZE, VELOCITY_COLUMNS,
};
use arrow::array::{Array, Float64Array, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{TimeZone, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            "gzip" => Compression::GZIP(GzipLevel::default()),
            "lz4" => Compression::LZ4,
            "zstd" => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write a velocity series; an empty series still gets a file with the schema.
    pub fn write_velocity(&self, samples: &[VelocitySample], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let schema = self.create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in samples.chunks(self.row_group_size.max(1)) {
            let batch = self.samples_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    /// `date` timestamp[ms, UTC], `speed` and `bearing` float64
    fn create_schema(&self) -> Arc<Schema> {
        let fields = vec![
            Field::new(
                VELOCITY_COLUMNS[0],
                DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
                false,
            ),
            Field::new(VELOCITY_COLUMNS[1], DataType::Float64, false),
            Field::new(VELOCITY_COLUMNS[2], DataType::Float64, false),
        ];

        Arc::new(Schema::new(fields))
    }

    fn samples_to_batch(&self, samples: &[VelocitySample], schema: Arc<Schema>) -> Result<RecordBatch> {
        let dates: Vec<i64> = samples.iter().map(|s| s.date.timestamp_millis()).collect();
        let speeds: Vec<f64> = samples.iter().map(|s| s.speed).collect();
        let bearings: Vec<f64> = samples.iter().map(|s| s.bearing).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(TimestampMillisecondArray::from(dates).with_timezone("UTC")),
                Arc::new(Float64Array::from(speeds)),
                Arc::new(Float64Array::from(bearings)),
            ],
        )?;

        Ok(batch)
    }

    /// Read a velocity series written by `write_velocity`.
    pub fn read_velocity(&self, path: &Path) -> Result<Vec<VelocitySample>> {
        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut samples = Vec::new();
        for batch_result in reader {
            let batch = batch_result?;

            let dates = batch
                .column(0)
                .as_any()
                .downcast_ref::<TimestampMillisecondArray>()
                .ok_or_else(|| ProcessingError::InvalidFormat("Invalid date column type".to_string()))?;
            let speeds = batch
                .column(1)
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| ProcessingError::InvalidFormat("Invalid speed column type".to_string()))?;
            let bearings = batch
                .column(2)
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| ProcessingError::InvalidFormat("Invalid bearing column type".to_string()))?;

            for i in 0..batch.num_rows() {
                let millis = dates.value(i);
                let date = Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!("Timestamp {} ms out of range", millis))
                })?;
                samples.push(VelocitySample::new(date, speeds.value(i), bearings.value(i)));
            }
        }

        Ok(samples)
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = fs::metadata(path)?.len();

        let row_group_sizes = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression: self.compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
            avg_rows
        )
    }
}
