use crate::error::{ProcessingError, Result};

/// Convert DMS (Degrees:Minutes:Seconds) format to decimal degrees
///
/// # Examples
/// ```
/// use icedrift_processor::utils::dms_to_decimal;
///
/// let decimal = dms_to_decimal("81:30:15").unwrap();
/// assert!((decimal - 81.504167).abs() < 0.000001);
/// ```
pub fn dms_to_decimal(dms: &str) -> Result<f64> {
    let parts: Vec<&str> = dms.split(':').collect();

    if parts.len() != 3 {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Invalid DMS format: '{}'. Expected format: 'DD:MM:SS'",
            dms
        )));
    }

    let is_negative = dms.trim_start().starts_with('-');

    let degrees = parts[0].trim().parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid degrees value: '{}'", parts[0]))
    })?;

    let minutes = parts[1].trim().parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid minutes value: '{}'", parts[1]))
    })?;

    let seconds = parts[2].trim().parse::<f64>().map_err(|_| {
        ProcessingError::InvalidCoordinate(format!("Invalid seconds value: '{}'", parts[2]))
    })?;

    if !(0.0..60.0).contains(&minutes) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Minutes must be between 0 and 60, got: {}",
            minutes
        )));
    }

    if !(0.0..60.0).contains(&seconds) {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Seconds must be between 0 and 60, got: {}",
            seconds
        )));
    }

    let decimal_value = degrees.abs() + minutes / 60.0 + seconds / 3600.0;

    if is_negative {
        Ok(-decimal_value)
    } else {
        Ok(decimal_value)
    }
}

/// Parse a coordinate written either as decimal degrees or as DMS
pub fn parse_coordinate(coord_str: &str) -> Result<f64> {
    let trimmed = coord_str.trim();

    let value = if !trimmed.contains(':') {
        trimmed.parse::<f64>().map_err(|_| {
            ProcessingError::InvalidCoordinate(format!("Invalid coordinate value: '{}'", coord_str))
        })?
    } else {
        dms_to_decimal(trimmed)?
    };

    // "nan" and "inf" parse as f64 but are not coordinates
    if !value.is_finite() {
        return Err(ProcessingError::InvalidCoordinate(format!(
            "Non-finite coordinate value: '{}'",
            coord_str
        )));
    }

    Ok(value)
}

/// Wrap a longitude into `[-180, 180)`.
pub fn normalize_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dms_to_decimal() {
        assert!((dms_to_decimal("81:30:15").unwrap() - 81.504167).abs() < 0.000001);
        assert!((dms_to_decimal("-0:07:39").unwrap() - -0.1275).abs() < 0.0001);
    }

    #[test]
    fn test_invalid_dms_format() {
        assert!(dms_to_decimal("81:30").is_err());
        assert!(dms_to_decimal("81:70:15").is_err());
        assert!(dms_to_decimal("81:30:70").is_err());
    }

    #[test]
    fn test_parse_coordinate() {
        assert!((parse_coordinate("82.4312").unwrap() - 82.4312).abs() < 0.000001);
        assert!((parse_coordinate(" -179.95 ").unwrap() - -179.95).abs() < 0.000001);
        assert!((parse_coordinate("81:30:15").unwrap() - 81.504167).abs() < 0.000001);
        assert!(parse_coordinate("").is_err());
        assert!(parse_coordinate("NaN").is_err());
        assert!(parse_coordinate("abc").is_err());
    }

    #[test]
    fn test_normalize_longitude() {
        assert!((normalize_longitude(190.0) - -170.0).abs() < 1e-12);
        assert!((normalize_longitude(-190.0) - 170.0).abs() < 1e-12);
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert!((normalize_longitude(12.5) - 12.5).abs() < 1e-12);
    }
}
