//! Device response-frame parser (C1).
//!
//! A frame is the ASCII line the Mato MTS-602R+ (and compatible devices)
//! return after a measurement command: four whitespace-separated fields,
//! slope distance / vertical angle / horizontal angle / status.

use crate::angle::parse_angle;
use crate::error::Error;
use edm_types::RawReading;

const MAX_SD_MM: f64 = 100_000.0;

/// Parse a trimmed response line into a raw reading.
pub fn parse_frame(line: &str) -> Result<RawReading, Error> {
    let malformed = |reason: &str| Error::MalformedFrame {
        raw: line.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(malformed(&format!(
            "expected 4 fields, got {}",
            fields.len()
        )));
    }

    let sd_mm: f64 = fields[0]
        .parse()
        .map_err(|_| malformed("slope-distance field is not numeric"))?;
    if !sd_mm.is_finite() || sd_mm < 0.0 || sd_mm > MAX_SD_MM {
        return Err(malformed("slope-distance field out of range"));
    }

    let va_deg = parse_angle(fields[1])?;
    let har_deg = parse_angle(fields[2])?;
    let status = fields[3].to_string();

    Ok(RawReading {
        slope_distance_mm: sd_mm,
        vertical_angle_deg: va_deg,
        horizontal_angle_deg: har_deg,
        status: Some(status),
    })
}

/// True once `buf` contains a complete, terminator-delimited frame.
pub fn is_frame_complete(buf: &[u8]) -> bool {
    buf.contains(&b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_worked_example() {
        let r = parse_frame("0008390 1001021 3080834 83").unwrap();
        assert!((r.slope_distance_mm - 8390.0).abs() < 1e-9);
        assert!((r.vertical_angle_deg - 100.172500).abs() < 1e-6);
        assert!((r.horizontal_angle_deg - 308.142778).abs() < 1e-5);
        assert_eq!(r.status.as_deref(), Some("83"));
    }

    #[test]
    fn tolerates_runs_of_spaces() {
        let r = parse_frame("0008390    1001021   3080834    83").unwrap();
        assert_eq!(r.status.as_deref(), Some("83"));
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert!(matches!(
            parse_frame("0008390 1001021 83"),
            Err(Error::MalformedFrame { .. })
        ));
    }

    #[test]
    fn rejects_non_numeric_sd() {
        assert!(matches!(
            parse_frame("abcdefg 1001021 3080834 83"),
            Err(Error::MalformedFrame { .. })
        ));
    }

    #[test]
    fn rejects_sd_over_max() {
        assert!(matches!(
            parse_frame("0999999999 1001021 3080834 83"),
            Err(Error::MalformedFrame { .. })
        ));
    }

    #[test]
    fn propagates_malformed_angle() {
        assert!(matches!(
            parse_frame("0008390 1006021 3080834 83"),
            Err(Error::MalformedAngle { .. })
        ));
    }

    #[test]
    fn frame_completion_detects_terminator() {
        assert!(!is_frame_complete(b"0008390 1001021 3080834 8"));
        assert!(is_frame_complete(b"0008390 1001021 3080834 83\n"));
    }
}
