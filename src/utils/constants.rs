/// Mean Earth radius (IUGG) used by the spherical model, in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Physical coordinate bounds
pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Pipeline defaults, as used for the CIRFA-2022 and N-ICE2015 buoy sets
pub const DEFAULT_THRESHOLD_GAP: &str = "4h";
pub const DEFAULT_THRESHOLD_SEGMENT: usize = 12;
pub const DEFAULT_FREQ: &str = "1h";
pub const DEFAULT_MAXGAP_MINUTES: i64 = 240;
pub const DEFAULT_PAIRS_ONLY: bool = true;

/// Speed above which a drifting buoy position is considered nonphysical, m/s.
pub const DEFAULT_MAX_SPEED_MPS: f64 = 1.5;

/// Elapsed time below which a velocity pair is rejected, seconds.
pub const MIN_ELAPSED_SECONDS: f64 = 1e-3;

/// Column names
pub const DATETIME_COLUMN: &str = "datetime";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const UNNAMED_INDEX_COLUMN: &str = "Unnamed: 0";
pub const ORIGIN_COLUMN: &str = "origin";
pub const VELOCITY_COLUMNS: [&str; 3] = ["date", "speed", "bearing"];

/// Output layout
pub const CLEANED_DIR: &str = "cleaned_data";
pub const VELOCITY_DIR: &str = "velocity";
pub const RESAMPLED_DIR: &str = "resampled";
pub const VELOCITY_SUFFIX: &str = "_velocity";
pub const OUTPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Environment prefix for configuration overrides (ICEDRIFT_THRESHOLD_GAP, ...)
pub const ENV_PREFIX: &str = "ICEDRIFT";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_NONE: &str = "none";
