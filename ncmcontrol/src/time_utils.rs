//! Time formatting and parsing helpers for now-playing rendering and seek input.

use crate::errors::ControlError;

/// Formats a duration in seconds as HH:MM:SS.
///
/// # Examples
/// ```
/// # use ncmcontrol::time_utils::format_hhmmss;
/// assert_eq!(format_hhmmss(0), "00:00:00");
/// assert_eq!(format_hhmmss(61), "00:01:01");
/// assert_eq!(format_hhmmss(3661), "01:01:01");
/// ```
pub fn format_hhmmss(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Formats fractional seconds as HH:MM:SS, rounding to the nearest second.
///
/// Negative values render as zero.
pub fn format_hhmmss_f64(seconds: f64) -> String {
    format_hhmmss(seconds.max(0.0).round() as u64)
}

/// Parses a time string in HH:MM:SS, MM:SS, or SS format to seconds.
///
/// A plain number may carry a fractional part ("12.5").
///
/// # Examples
/// ```
/// # use ncmcontrol::time_utils::parse_time_flexible;
/// assert_eq!(parse_time_flexible("01:02:03").unwrap(), 3723.0);
/// assert_eq!(parse_time_flexible("02:03").unwrap(), 123.0);
/// assert_eq!(parse_time_flexible("42.5").unwrap(), 42.5);
/// ```
pub fn parse_time_flexible(input: &str) -> Result<f64, ControlError> {
    let input = input.trim();
    let parts: Vec<&str> = input.split(':').collect();

    if input.is_empty() || parts.len() > 3 {
        return Err(ControlError::InvalidTimeFormat(format!(
            "Invalid time format '{}': expected HH:MM:SS, MM:SS, or SS",
            input
        )));
    }

    if parts.len() == 1 {
        return match input.parse::<f64>() {
            Ok(value) if value >= 0.0 && value.is_finite() => Ok(value),
            _ => Err(ControlError::InvalidTimeFormat(format!(
                "Invalid numeric value '{}'",
                input
            ))),
        };
    }

    let mut total = 0u64;
    for part in parts {
        let value = part.parse::<u64>().map_err(|_| {
            ControlError::InvalidTimeFormat(format!(
                "Invalid numeric value '{}' in time string '{}'",
                part, input
            ))
        })?;
        total = total * 60 + value;
    }

    Ok(total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_f64_rounds_and_clamps() {
        assert_eq!(format_hhmmss_f64(59.6), "00:01:00");
        assert_eq!(format_hhmmss_f64(-3.0), "00:00:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_time_flexible("").is_err());
        assert!(parse_time_flexible("1:2:3:4").is_err());
        assert!(parse_time_flexible("aa:10").is_err());
        assert!(parse_time_flexible("-4").is_err());
    }
}
