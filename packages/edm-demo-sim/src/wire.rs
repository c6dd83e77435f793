//! Wire encoding/decoding for the emulated Mato protocol. Reuses the real
//! translator's `to_wire_summary` so the emulator and the production
//! `Translator` impls can never drift apart on frame shape.

use edm_core::translator::{MatoMts602R, Translator, STATUS_NORMAL};
use edm_types::{AveragedReading, RawReading};

pub const MEASUREMENT_COMMAND: [u8; 3] = [0x11, 0x0D, 0x0A];

/// Encode a reading as the device would send it, terminator included.
pub fn encode_frame(reading: &AveragedReading) -> Vec<u8> {
    let raw = RawReading {
        slope_distance_mm: reading.slope_distance_mm,
        vertical_angle_deg: reading.vertical_angle_deg,
        horizontal_angle_deg: reading.horizontal_angle_deg,
        status: Some(STATUS_NORMAL.to_string()),
    };
    let mut line = MatoMts602R.to_wire_summary(&raw);
    line.push('\n');
    line.into_bytes()
}

/// Whether `buf`'s tail matches the three-byte measurement command.
pub fn ends_with_command(buf: &[u8]) -> bool {
    buf.len() >= MEASUREMENT_COMMAND.len() && buf[buf.len() - MEASUREMENT_COMMAND.len()..] == MEASUREMENT_COMMAND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_command_suffix() {
        assert!(ends_with_command(&[0x11, 0x0D, 0x0A]));
        assert!(ends_with_command(&[0xFF, 0x11, 0x0D, 0x0A]));
        assert!(!ends_with_command(&[0x11, 0x0D, 0x00]));
    }

    #[test]
    fn encoded_frame_ends_in_newline() {
        let reading = AveragedReading {
            slope_distance_mm: 8390.0,
            vertical_angle_deg: 100.1725,
            horizontal_angle_deg: 308.142778,
        };
        let frame = encode_frame(&reading);
        assert_eq!(*frame.last().unwrap(), b'\n');
    }
}
