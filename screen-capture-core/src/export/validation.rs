//! Pre-upload artifact checks and the display formatters they share with the
//! controls and export surfaces.

use chrono::{DateTime, Local};
use serde::Serialize;
use thiserror::Error;

use crate::models::config::MAX_CAPTURE_DURATION_SECS;

/// Largest artifact accepted for upload (100 MiB).
pub const MAX_ARTIFACT_BYTES: u64 = 100 * 1024 * 1024;

/// Anything smaller is treated as a failed recording.
pub const MIN_ARTIFACT_BYTES: u64 = 1000;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File size ({}) exceeds maximum allowed size ({})", format_file_size(*.size), format_file_size(*.max))]
    SizeExceeded { size: u64, max: u64 },

    #[error("Duration ({}) exceeds maximum allowed duration ({})", format_duration(*.duration_secs), format_duration(*.max_secs))]
    DurationExceeded { duration_secs: u32, max_secs: u32 },

    #[error("Recording file is too small. Please try recording again.")]
    TooSmall { size: u64 },
}

/// Every violation found, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    #[serde(serialize_with = "serialize_messages")]
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

fn serialize_messages<S: serde::Serializer>(errors: &[ValidationError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}

pub fn validate_recording(size_bytes: u64, duration_secs: u32) -> ValidationReport {
    let mut errors = Vec::new();
    if size_bytes > MAX_ARTIFACT_BYTES {
        errors.push(ValidationError::SizeExceeded {
            size: size_bytes,
            max: MAX_ARTIFACT_BYTES,
        });
    }
    if duration_secs > MAX_CAPTURE_DURATION_SECS {
        errors.push(ValidationError::DurationExceeded {
            duration_secs,
            max_secs: MAX_CAPTURE_DURATION_SECS,
        });
    }
    if size_bytes < MIN_ARTIFACT_BYTES {
        errors.push(ValidationError::TooSmall { size: size_bytes });
    }
    ValidationReport { errors }
}

/// 1024-based size with at most two decimals, e.g. `1.5 KB`, `100 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// `m:ss`
pub fn format_duration(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// `mm:ss`, as shown next to the live indicator.
pub fn format_elapsed(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn generate_default_filename() -> String {
    filename_for(Local::now())
}

fn filename_for(now: DateTime<Local>) -> String {
    now.format("Screen_Recording_%d-%m-%Y_%H-%M-%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn size_boundaries() {
        assert!(validate_recording(99 * MIB, 60).is_valid());

        let too_big = validate_recording(101 * MIB, 60);
        assert_eq!(
            too_big.errors,
            vec![ValidationError::SizeExceeded {
                size: 101 * MIB,
                max: MAX_ARTIFACT_BYTES
            }]
        );
        assert_eq!(
            too_big.messages(),
            vec!["File size (101 MB) exceeds maximum allowed size (100 MB)"]
        );

        let too_small = validate_recording(500, 10);
        assert_eq!(too_small.errors, vec![ValidationError::TooSmall { size: 500 }]);
        assert_eq!(
            too_small.messages(),
            vec!["Recording file is too small. Please try recording again."]
        );
    }

    #[test]
    fn exact_limits_are_valid() {
        assert!(validate_recording(MAX_ARTIFACT_BYTES, 180).is_valid());
        assert!(validate_recording(MIN_ARTIFACT_BYTES, 0).is_valid());
    }

    #[test]
    fn collects_every_violation() {
        let report = validate_recording(0, 185);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(
            report.messages()[0],
            "Duration (3:05) exceeds maximum allowed duration (3:00)"
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"][1], "Recording file is too small. Please try recording again.");
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(500), "500 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(100 * MIB), "100 MB");
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
        assert_eq!(format_file_size(3 * 1024 * MIB), "3 GB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(180), "3:00");
        assert_eq!(format_elapsed(7), "00:07");
        assert_eq!(format_elapsed(125), "02:05");
    }

    #[test]
    fn default_filename_layout() {
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(filename_for(at), "Screen_Recording_09-03-2024_14-05-07");
        assert!(generate_default_filename().starts_with("Screen_Recording_"));
    }
}
