//! DDD°MM′SS[.s]″ angle parsing and formatting (C1).
//!
//! Truncating the fractional second throws away ~0.3″ of angular precision,
//! which is roughly 60 mm of distance error at competition ranges. The
//! fractional digits are carried through to the final division, never
//! dropped.

use crate::error::Error;

/// Parse a 6- or 7-digit angle token (optionally followed by `.` and
/// fractional-second digits) into decimal degrees.
pub fn parse_angle(token: &str) -> Result<f64, Error> {
    let malformed = |reason: &str| Error::MalformedAngle {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    let (int_part, frac_part) = match token.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (token, None),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("integer part is not all digits"));
    }
    if let Some(f) = frac_part {
        if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed("fractional part is not all digits"));
        }
    }

    let padded = match int_part.len() {
        6 => format!("0{int_part}"),
        7 => int_part.to_string(),
        n => return Err(malformed(&format!("expected 6 or 7 digits, got {n}"))),
    };

    let deg: u32 = padded[0..3].parse().unwrap();
    let min: u32 = padded[3..5].parse().unwrap();
    let sec_int: u32 = padded[5..7].parse().unwrap();

    if deg > 360 {
        return Err(malformed("degrees > 360"));
    }
    if min >= 60 {
        return Err(malformed("minutes >= 60"));
    }
    if sec_int >= 60 {
        return Err(malformed("seconds >= 60"));
    }

    let sec: f64 = match frac_part {
        Some(f) => format!("{sec_int}.{f}").parse().unwrap(),
        None => sec_int as f64,
    };

    Ok(deg as f64 + min as f64 / 60.0 + sec / 3600.0)
}

/// Format decimal degrees back into a `DDDMMSS.ssssss` token. Round-trips
/// through `parse_angle` to within 1e-6 degree.
pub fn format_angle(decimal_deg: f64) -> String {
    let mut deg = decimal_deg.trunc() as i64;
    let rem_min = (decimal_deg - deg as f64) * 60.0;
    let mut min = rem_min.trunc() as i64;
    let mut sec = (rem_min - min as f64) * 60.0;

    // `{:09.6}` rounds; a value like 59.9999996 prints as 60.000000, which
    // parse_angle would reject. Carry the rounded overflow into minutes/degrees
    // instead of letting it leak into the formatted seconds field.
    if (sec * 1e6).round() / 1e6 >= 60.0 {
        sec = 0.0;
        min += 1;
    }
    if min >= 60 {
        min = 0;
        deg += 1;
    }

    format!("{:03}{:02}{:09.6}", deg, min, sec)
}
