pub mod mask;
pub mod position;
pub mod track;
pub mod velocity;

pub use mask::BooleanMask;
pub use position::{Coordinate, Parsed, PositionSample, RawSample, Rejection};
pub use track::{GridPoint, PointOrigin, ResampledTrack, TimedPositions, Track};
pub use velocity::VelocitySample;
