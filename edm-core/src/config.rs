//! Process-wide configuration, read from the environment the same way the
//! teacher's `UwbHubConfig::default()` does: `std::env::var(...).ok()
//! .and_then(|v| v.parse().ok()).unwrap_or(default)`.

use edm_types::CircleType;

/// Recognized options (§6): `demoMode` and `defaultCircleType`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Replaces Transport with the synthetic simulator (C7).
    pub demo_mode: bool,
    /// Used when no Calibration exists for a device.
    pub default_circle_type: CircleType,
    /// Path to the calibration persistence file.
    pub calibration_path: std::path::PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            demo_mode: std::env::var("EDM_DEMO_MODE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            default_circle_type: std::env::var("EDM_DEFAULT_CIRCLE")
                .ok()
                .and_then(|v| parse_circle_type(&v))
                .unwrap_or(CircleType::Shot),
            calibration_path: std::env::var("EDM_CALIBRATION_PATH")
                .map(std::path::PathBuf::from)
                .unwrap_or_else(|_| std::path::PathBuf::from("calibration.json")),
        }
    }
}

fn parse_circle_type(s: &str) -> Option<CircleType> {
    match s.to_ascii_uppercase().as_str() {
        "SHOT" => Some(CircleType::Shot),
        "DISCUS" => Some(CircleType::Discus),
        "HAMMER" => Some(CircleType::Hammer),
        "JAVELIN_ARC" | "JAVELIN" => Some(CircleType::JavelinArc),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_circle_types() {
        assert_eq!(parse_circle_type("shot"), Some(CircleType::Shot));
        assert_eq!(parse_circle_type("JAVELIN_ARC"), Some(CircleType::JavelinArc));
        assert_eq!(parse_circle_type("trampoline"), None);
    }
}
