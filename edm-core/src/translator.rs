//! Device translators (C2): per-device command bytes, frame recognition,
//! and status-code interpretation, behind a capability-set trait rather
//! than an inheritance hierarchy. New devices register by implementing
//! `Translator` and being added to a `TranslatorRegistry`, not by
//! subclassing a base station type.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::frame::parse_frame;
use edm_types::RawReading;

/// Status token the device reports when a reading is nominal.
pub const STATUS_NORMAL: &str = "83";

/// The capability set a device implementation must provide.
pub trait Translator: Send + Sync {
    /// Bytes to write to request a measurement.
    fn measurement_command(&self) -> &'static [u8];

    /// Parse a complete frame (terminator included or stripped, either is fine).
    fn parse_frame(&self, raw: &[u8]) -> Result<RawReading, Error>;

    /// Whether `buf` already contains a full frame.
    fn is_frame_complete(&self, buf: &[u8]) -> bool;

    /// Human-readable interpretation of a raw status token. Never fails;
    /// unrecognized tokens get a generic advisory string.
    fn interpret_status(&self, token: &str) -> String;

    /// Re-serialise a reading the way the device would have sent it.
    /// `parse_frame(to_wire_summary(r))` must yield the same three numeric
    /// fields as `r`.
    fn to_wire_summary(&self, reading: &RawReading) -> String;

    fn name(&self) -> &'static str;
}

/// Mato MTS-602R+ and protocol-compatible total stations.
#[derive(Debug, Default, Clone, Copy)]
pub struct MatoMts602R;

const MATO_COMMAND: [u8; 3] = [0x11, 0x0D, 0x0A];

impl Translator for MatoMts602R {
    fn measurement_command(&self) -> &'static [u8] {
        &MATO_COMMAND
    }

    fn parse_frame(&self, raw: &[u8]) -> Result<RawReading, Error> {
        let text = String::from_utf8_lossy(raw);
        parse_frame(text.trim())
    }

    fn is_frame_complete(&self, buf: &[u8]) -> bool {
        crate::frame::is_frame_complete(buf)
    }

    fn interpret_status(&self, token: &str) -> String {
        if token == STATUS_NORMAL {
            "normal".to_string()
        } else {
            format!("advisory: unrecognized status token {token:?}")
        }
    }

    fn to_wire_summary(&self, reading: &RawReading) -> String {
        format!(
            "{:07.0} {} {} {}",
            reading.slope_distance_mm,
            crate::angle::format_angle(reading.vertical_angle_deg),
            crate::angle::format_angle(reading.horizontal_angle_deg),
            reading.status.as_deref().unwrap_or(STATUS_NORMAL),
        )
    }

    fn name(&self) -> &'static str {
        "mato-mts602r"
    }
}

/// Fallback used for an unrecognized (or generically-bridged) device:
/// default Mato command set, 9600 baud. Distinguished from `MatoMts602R`
/// only by name, for logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSerialAdapter;

impl Translator for GenericSerialAdapter {
    fn measurement_command(&self) -> &'static [u8] {
        &MATO_COMMAND
    }

    fn parse_frame(&self, raw: &[u8]) -> Result<RawReading, Error> {
        MatoMts602R.parse_frame(raw)
    }

    fn is_frame_complete(&self, buf: &[u8]) -> bool {
        MatoMts602R.is_frame_complete(buf)
    }

    fn interpret_status(&self, token: &str) -> String {
        MatoMts602R.interpret_status(token)
    }

    fn to_wire_summary(&self, reading: &RawReading) -> String {
        MatoMts602R.to_wire_summary(reading)
    }

    fn name(&self) -> &'static str {
        "generic-serial-adapter"
    }
}

/// Maps (vendor id, product id) to translators; unknown pairs fall back to
/// the generic adapter rather than `None`, since unknown devices should
/// still surface as usable (if ignorable) EDM carriers to the operator.
pub struct TranslatorRegistry {
    known: HashMap<(u16, u16), Arc<dyn Translator>>,
    fallback: Arc<dyn Translator>,
}

impl TranslatorRegistry {
    /// Populated with the common USB-to-serial bridges named in §6, all
    /// mapped to the generic adapter using default settings.
    pub fn with_default_bridges() -> Self {
        let generic: Arc<dyn Translator> = Arc::new(GenericSerialAdapter);
        let mut known: HashMap<(u16, u16), Arc<dyn Translator>> = HashMap::new();
        for (vid, pid) in [
            (0x1A86, 0x7523), // CH340
            (0x0403, 0x6001), // FT232
            (0x067B, 0x2303), // PL2303
            (0x10C4, 0xEA60), // CP2102
        ] {
            known.insert((vid, pid), generic.clone());
        }
        Self {
            known,
            fallback: generic,
        }
    }

    pub fn register(&mut self, vendor_id: u16, product_id: u16, translator: Arc<dyn Translator>) {
        self.known.insert((vendor_id, product_id), translator);
    }

    /// Resolve a (vendor, product) pair. Never returns `None`: unknown
    /// pairs resolve to the generic fallback.
    pub fn resolve(&self, vendor_id: u16, product_id: u16) -> Arc<dyn Translator> {
        self.known
            .get(&(vendor_id, product_id))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for TranslatorRegistry {
    fn default() -> Self {
        Self::with_default_bridges()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mato_command_is_three_bytes() {
        assert_eq!(MatoMts602R.measurement_command(), &[0x11, 0x0D, 0x0A]);
    }

    #[test]
    fn status_interpretation() {
        assert_eq!(MatoMts602R.interpret_status("83"), "normal");
        assert!(MatoMts602R.interpret_status("77").contains("advisory"));
    }

    #[test]
    fn wire_summary_round_trips_numeric_fields() {
        let t = MatoMts602R;
        let reading = t.parse_frame(b"0008390 1001021 3080834 83").unwrap();
        let summary = t.to_wire_summary(&reading);
        let reparsed = t.parse_frame(summary.as_bytes()).unwrap();
        assert!((reading.slope_distance_mm - reparsed.slope_distance_mm).abs() < 1e-6);
        assert!((reading.vertical_angle_deg - reparsed.vertical_angle_deg).abs() < 1e-6);
        assert!((reading.horizontal_angle_deg - reparsed.horizontal_angle_deg).abs() < 1e-6);
    }

    #[test]
    fn unknown_vid_pid_resolves_to_generic_fallback() {
        let registry = TranslatorRegistry::with_default_bridges();
        let t = registry.resolve(0xDEAD, 0xBEEF);
        assert_eq!(t.name(), "generic-serial-adapter");
    }

    #[test]
    fn known_bridges_resolve_to_generic_adapter() {
        let registry = TranslatorRegistry::with_default_bridges();
        assert_eq!(registry.resolve(0x1A86, 0x7523).name(), "generic-serial-adapter");
        assert_eq!(registry.resolve(0x0403, 0x6001).name(), "generic-serial-adapter");
        assert_eq!(registry.resolve(0x067B, 0x2303).name(), "generic-serial-adapter");
        assert_eq!(registry.resolve(0x10C4, 0xEA60).name(), "generic-serial-adapter");
    }
}
