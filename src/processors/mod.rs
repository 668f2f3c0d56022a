pub mod batch_processor;
pub mod gap_segmenter;
pub mod pipeline;
pub mod position_validator;
pub mod track_interpolator;
pub mod velocity_computer;

pub use batch_processor::{find_track_files, BatchProcessor, BatchReport, TrackOutcome};
pub use gap_segmenter::{GapSegmenter, Segment};
pub use pipeline::{PipelineOutput, PipelineStage, TrackPipeline, TrackReport};
pub use position_validator::{PositionFlag, PositionValidator};
pub use track_interpolator::TrackInterpolator;
pub use velocity_computer::{DerivedVelocity, VelocityComputer, VelocityIter};
