pub mod track_reader;

pub use track_reader::{IngestReport, InputSchema, TrackReader};
