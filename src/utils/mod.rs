pub mod constants;
pub mod coordinates;
pub mod duration;
pub mod filename;
pub mod geodesy;
pub mod progress;
pub mod timestamps;

pub use constants::*;
pub use coordinates::{dms_to_decimal, normalize_longitude, parse_coordinate};
pub use duration::{format_duration, parse_duration};
pub use filename::{buoy_id_from_path, cleaned_track_path, resampled_track_path, velocity_path};
pub use geodesy::{haversine_distance, initial_bearing, interpolate_coordinate, PolarStereographic};
pub use progress::ProgressReporter;
pub use timestamps::{format_timestamp, parse_timestamp};
