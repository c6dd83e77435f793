//! Error taxonomy for the EDM core (§7).

use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("malformed angle token {token:?}: {reason}")]
    MalformedAngle { token: String, reason: String },

    #[error("malformed response frame {raw:?}: {reason}")]
    MalformedFrame { raw: String, reason: String },

    #[error("timeout waiting for device response: {hint}")]
    Timeout { hint: String },

    #[error("paired readings disagree: sd1={sd1_mm}mm sd2={sd2_mm}mm diff={diff_mm}mm")]
    Inconsistent {
        sd1_mm: f64,
        sd2_mm: f64,
        diff_mm: f64,
    },

    #[error("device {device_id} has no circle type configured")]
    NotConfigured { device_id: String },

    #[error("device {device_id} has no centre set")]
    CentreNotSet { device_id: String },

    #[error("device {device_id} is not calibrated (centre and in-tolerance edge required)")]
    NotCalibrated { device_id: String },

    #[error("serial port {port} unavailable: {reason}")]
    PortUnavailable { port: String, reason: String },

    #[error("permission denied opening {port}")]
    PermissionDenied { port: String },

    #[error("failed to persist calibration for {device_id}: {reason}")]
    PersistenceFailure { device_id: String, reason: String },

    #[error("io error")]
    Io(#[from] std::io::Error),
}
