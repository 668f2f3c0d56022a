use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use memmap2::Mmap;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{Parsed, RawSample, Rejection, Track};
use crate::utils::constants::{
    DATETIME_COLUMN, DEFAULT_BUFFER_SIZE, LATITUDE_COLUMN, LONGITUDE_COLUMN, UNNAMED_INDEX_COLUMN,
};
use crate::utils::coordinates::parse_coordinate;
use crate::utils::filename::buoy_id_from_path;
use crate::utils::timestamps::parse_timestamp;

/// Layout of a track file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputSchema {
    /// `datetime, latitude, longitude` with no header row
    Headerless,
    /// Header row naming `datetime` (or an unlabeled index column), `latitude`, `longitude`
    Headered,
    /// Headerless when the first field of the first row is a timestamp
    Auto,
}

/// Row counts from ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub rows: usize,
    pub accepted: usize,
    pub missing_timestamp: usize,
    pub missing_coordinate: usize,
    pub out_of_range: usize,
}

impl IngestReport {
    pub fn excluded(&self) -> usize {
        self.missing_timestamp + self.missing_coordinate + self.out_of_range
    }

    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::MissingTimestamp => self.missing_timestamp += 1,
            Rejection::MissingCoordinate => self.missing_coordinate += 1,
            Rejection::OutOfRange => self.out_of_range += 1,
        }
    }
}

/// Column positions resolved from the schema.
#[derive(Debug, Clone, PartialEq)]
struct ColumnLayout {
    datetime: usize,
    latitude: usize,
    longitude: usize,
    passthrough: Vec<(usize, String)>,
}

pub struct TrackReader {
    schema: InputSchema,
    use_mmap: bool,
}

impl TrackReader {
    pub fn new(schema: InputSchema) -> Self {
        Self {
            schema,
            use_mmap: false,
        }
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Read one buoy track; the buoy id is the file stem.
    pub fn read_track(&self, path: &Path) -> Result<(Track, IngestReport)> {
        let buoy_id = buoy_id_from_path(path);
        let source = path.display().to_string();
        let file = File::open(path)?;

        if self.use_mmap {
            if file.metadata()?.len() == 0 {
                return Ok((Track::new(buoy_id, Vec::new()), IngestReport::default()));
            }
            let mmap = unsafe { Mmap::map(&file)? };
            self.read_from(&mmap[..], &buoy_id, &source)
        } else {
            self.read_from(std::io::BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file), &buoy_id, &source)
        }
    }

    /// Read a track from any CSV source. `source` names it in error messages.
    pub fn read_from<R: Read>(&self, input: R, buoy_id: &str, source: &str) -> Result<(Track, IngestReport)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input);

        let mut records = reader.records();
        let first = match records.next() {
            Some(record) => record?,
            None => return Ok((Track::new(buoy_id, Vec::new()), IngestReport::default())),
        };

        let headerless = match self.schema {
            InputSchema::Headerless => true,
            InputSchema::Headered => false,
            InputSchema::Auto => first.get(0).map_or(false, |f| parse_timestamp(f).is_ok()),
        };

        let layout = if headerless {
            headerless_layout(first.len())
        } else {
            headered_layout(&first, source)?
        };

        let mut report = IngestReport::default();
        let mut samples = Vec::new();

        let mut push = |record: &StringRecord, report: &mut IngestReport| {
            report.rows += 1;
            match parse_row(record, &layout).into_sample() {
                Ok(sample) => {
                    report.accepted += 1;
                    samples.push(sample);
                }
                Err(rejection) => report.record(rejection),
            }
        };

        if headerless {
            push(&first, &mut report);
        }
        for record in records {
            push(&record?, &mut report);
        }

        debug!(
            buoy = %buoy_id,
            rows = report.rows,
            accepted = report.accepted,
            excluded = report.excluded(),
            "track read"
        );

        let columns = layout.passthrough.iter().map(|(_, name)| name.clone()).collect();
        Ok((Track::new(buoy_id, samples).with_passthrough_columns(columns), report))
    }
}

impl Default for TrackReader {
    fn default() -> Self {
        Self::new(InputSchema::Auto)
    }
}

fn headerless_layout(width: usize) -> ColumnLayout {
    ColumnLayout {
        datetime: 0,
        latitude: 1,
        longitude: 2,
        passthrough: (3..width).map(|i| (i, format!("column_{}", i))).collect(),
    }
}

fn headered_layout(header: &StringRecord, source: &str) -> Result<ColumnLayout> {
    let find = |names: &[&str]| {
        header
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };

    let missing = |column: &str| ProcessingError::MissingColumn {
        column: column.to_string(),
        file: source.to_string(),
    };

    // an unlabeled leading index column holds the timestamps
    let datetime = find(&[DATETIME_COLUMN])
        .or_else(|| find(&[UNNAMED_INDEX_COLUMN]))
        .or_else(|| header.get(0).filter(|h| h.is_empty()).map(|_| 0))
        .ok_or_else(|| missing(DATETIME_COLUMN))?;
    let latitude = find(&[LATITUDE_COLUMN, "lat"]).ok_or_else(|| missing(LATITUDE_COLUMN))?;
    let longitude = find(&[LONGITUDE_COLUMN, "lon"]).ok_or_else(|| missing(LONGITUDE_COLUMN))?;

    let passthrough = header
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != datetime && *i != latitude && *i != longitude)
        .map(|(i, name)| (i, name.to_string()))
        .collect();

    Ok(ColumnLayout {
        datetime,
        latitude,
        longitude,
        passthrough,
    })
}

fn parse_row(record: &StringRecord, layout: &ColumnLayout) -> RawSample {
    let field = |i: usize| record.get(i).unwrap_or("");

    let timestamp = match parse_timestamp(field(layout.datetime)) {
        Ok(t) => Parsed::Valid(t),
        Err(_) => Parsed::Missing(field(layout.datetime).to_string()),
    };
    let coordinate = |i: usize| match parse_coordinate(field(i)) {
        Ok(v) => Parsed::Valid(v),
        Err(_) => Parsed::Missing(field(i).to_string()),
    };

    RawSample {
        timestamp,
        latitude: coordinate(layout.latitude),
        longitude: coordinate(layout.longitude),
        passthrough: layout
            .passthrough
            .iter()
            .map(|(i, _)| field(*i).to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_headerless_schema() {
        let data = "2022-03-01 00:00:00,78.10,12.50\n\
                    2022-03-01 01:00:00,78.11,12.52\n\
                    bad-date,78.12,12.54\n\
                    2022-03-01 03:00:00,,12.56\n\
                    2022-03-01 04:00:00,95.0,12.58\n";
        let (track, report) = TrackReader::new(InputSchema::Auto)
            .read_from(data.as_bytes(), "cirfa", "inline")
            .unwrap();

        assert_eq!(report.rows, 5);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.missing_timestamp, 1);
        assert_eq!(report.missing_coordinate, 1);
        assert_eq!(report.out_of_range, 1);
        assert_eq!(track.len(), 2);
        assert!(track.passthrough_columns.is_empty());
    }

    #[test]
    fn test_headered_schema_keeps_passthrough() {
        let data = "datetime,latitude,longitude,air_temp\n\
                    2015-01-20 00:00:00,82.9,19.1,-25.3\n\
                    2015-01-20 01:00:00,82.91,19.12,-25.1\n";
        let (track, report) = TrackReader::default()
            .read_from(data.as_bytes(), "nice", "inline")
            .unwrap();

        assert_eq!(report.accepted, 2);
        assert_eq!(track.passthrough_columns, vec!["air_temp"]);
        assert_eq!(track.samples()[1].passthrough, vec!["-25.1"]);
    }

    #[test]
    fn test_unnamed_index_column_becomes_datetime() {
        let data = ",latitude,longitude\n\
                    2015-01-20 00:00:00,82.9,19.1\n";
        let (track, _) = TrackReader::new(InputSchema::Headered)
            .read_from(data.as_bytes(), "nice", "inline")
            .unwrap();
        assert_eq!(track.len(), 1);

        let data = "Unnamed: 0,longitude,latitude\n\
                    2015-01-20 00:00:00,19.1,82.9\n";
        let (track, _) = TrackReader::new(InputSchema::Headered)
            .read_from(data.as_bytes(), "nice", "inline")
            .unwrap();
        assert_eq!(track.samples()[0].latitude(), 82.9);
        assert_eq!(track.samples()[0].longitude(), 19.1);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let data = "time,latitude,longitude\n2015-01-20 00:00:00,82.9,19.1\n";
        let result = TrackReader::new(InputSchema::Headered).read_from(data.as_bytes(), "x", "inline");
        assert!(matches!(result, Err(ProcessingError::MissingColumn { .. })));
    }

    #[test]
    fn test_read_file_with_mmap() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "2022-03-01 00:00:00,78.10,12.50")?;
        writeln!(file, "2022-03-01 01:00:00,78.11,12.52")?;

        let (track, report) = TrackReader::new(InputSchema::Headerless)
            .with_mmap(true)
            .read_track(file.path())?;

        assert_eq!(report.accepted, 2);
        assert_eq!(track.len(), 2);
        Ok(())
    }

    #[test]
    fn test_empty_input() {
        let (track, report) = TrackReader::default()
            .read_from("".as_bytes(), "x", "inline")
            .unwrap();
        assert!(track.is_empty());
        assert_eq!(report.rows, 0);
    }
}
