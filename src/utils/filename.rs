use std::path::{Path, PathBuf};

use crate::utils::constants::{CLEANED_DIR, RESAMPLED_DIR, VELOCITY_DIR, VELOCITY_SUFFIX};

/// Buoy identifier taken from a track file name, e.g. `buoy_2022_01.csv` -> `buoy_2022_01`
pub fn buoy_id_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Cleaned track path: `{dir}/cleaned_data/{file name}`
pub fn cleaned_track_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let dir = output_dir.map(Path::to_path_buf).unwrap_or_else(|| {
        input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CLEANED_DIR)
    });
    dir.join(input.file_name().unwrap_or_default())
}

/// Resampled track path: `{dir}/resampled/{file name}`
pub fn resampled_track_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let dir = output_dir.map(Path::to_path_buf).unwrap_or_else(|| {
        input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(RESAMPLED_DIR)
    });
    dir.join(input.file_name().unwrap_or_default())
}

/// Velocity series path: `{dir}/velocity/{stem}_velocity.{extension}`
pub fn velocity_path(input: &Path, output_dir: Option<&Path>, extension: &str) -> PathBuf {
    let dir = output_dir.map(Path::to_path_buf).unwrap_or_else(|| {
        input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(VELOCITY_DIR)
    });
    dir.join(format!(
        "{}{}.{}",
        buoy_id_from_path(input),
        VELOCITY_SUFFIX,
        extension
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buoy_id_from_path() {
        assert_eq!(
            buoy_id_from_path(Path::new("data/cirfa2022/CIRFA22_0042.csv")),
            "CIRFA22_0042"
        );
    }

    #[test]
    fn test_cleaned_track_path_defaults_next_to_input() {
        let path = cleaned_track_path(Path::new("data/n-ice2015/buoy7.csv"), None);
        assert_eq!(path, PathBuf::from("data/n-ice2015/cleaned_data/buoy7.csv"));

        let path = cleaned_track_path(Path::new("data/buoy7.csv"), Some(Path::new("out")));
        assert_eq!(path, PathBuf::from("out/buoy7.csv"));

        let path = resampled_track_path(Path::new("data/buoy7.csv"), None);
        assert_eq!(path, PathBuf::from("data/resampled/buoy7.csv"));
    }

    #[test]
    fn test_velocity_path() {
        let path = velocity_path(Path::new("data/buoy7.csv"), None, "parquet");
        assert_eq!(path, PathBuf::from("data/velocity/buoy7_velocity.parquet"));
    }
}
