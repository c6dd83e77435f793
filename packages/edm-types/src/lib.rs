//! # edm-types
//!
//! Shared data types for the field-event EDM controller.
//!
//! These types are used by:
//! - `edm-core`: codec, geometry, calibration store, and orchestrator
//! - `edm-demo-sim`: the standalone hardware emulator, to build wire frames
//!   that decode back into the same `RawReading`/`Point` shapes
//!
//! ## Coordinate conventions
//!
//! - **Device frame**: slope distance (mm) + vertical angle from zenith (deg)
//!   + horizontal angle (deg, 0–360 clockwise from the device's zero mark).
//! - **Circle frame**: 2-D Cartesian `(x, y)` in metres, origin at the circle
//!   centre. Station coordinates place the EDM within this frame.

use serde::{Deserialize, Serialize};

// ── Circle geometry ────────────────────────────────────────────────────────

/// Regulation throwing circle (or javelin arc) in use for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircleType {
    Shot,
    Discus,
    Hammer,
    JavelinArc,
}

impl CircleType {
    /// Canonical target radius in metres (World Athletics / UKA).
    pub fn target_radius_m(&self) -> f64 {
        match self {
            CircleType::Shot => 1.0675,
            CircleType::Discus => 1.250,
            CircleType::Hammer => 1.0675,
            CircleType::JavelinArc => 8.000,
        }
    }

    /// Allowable edge-radius deviation, in millimetres.
    pub fn tolerance_mm(&self) -> f64 {
        match self {
            CircleType::JavelinArc => 10.0,
            _ => 5.0,
        }
    }

    /// Sector half-spread is not applicable to the javelin arc (a fan, not a sector line).
    pub fn has_sector_line(&self) -> bool {
        !matches!(self, CircleType::JavelinArc)
    }
}

impl Default for CircleType {
    fn default() -> Self {
        CircleType::Shot
    }
}

/// Standard throws-circle sector angle, in degrees.
pub const SECTOR_ANGLE_DEG: f64 = 34.92;

// ── Cartesian point ────────────────────────────────────────────────────────

/// A point in the circle-centre frame, metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance from the origin.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Bearing from the origin, degrees, `atan2(y, x)`.
    pub fn angle_deg(&self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Rotate this point about the origin by `deg` degrees, counter-clockwise.
    pub fn rotate_deg(&self, deg: f64) -> Point {
        let rad = deg.to_radians();
        let (s, c) = rad.sin_cos();
        Point::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }
}

// ── Device readings ────────────────────────────────────────────────────────

/// One raw device exchange: slope distance, two angles, optional status token.
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    /// Slope distance in millimetres, positive.
    pub slope_distance_mm: f64,
    /// Vertical angle from zenith, decimal degrees (typically 85-95 deg for a near-level sight).
    pub vertical_angle_deg: f64,
    /// Horizontal angle from the device's zero mark, decimal degrees, 0-360.
    pub horizontal_angle_deg: f64,
    /// Raw status token as returned by the device, uninterpreted.
    pub status: Option<String>,
}

/// Either a single promoted `RawReading` or the mean of a consistent pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragedReading {
    pub slope_distance_mm: f64,
    pub vertical_angle_deg: f64,
    pub horizontal_angle_deg: f64,
}

impl AveragedReading {
    pub fn from_single(r: &RawReading) -> Self {
        Self {
            slope_distance_mm: r.slope_distance_mm,
            vertical_angle_deg: r.vertical_angle_deg,
            horizontal_angle_deg: r.horizontal_angle_deg,
        }
    }

    pub fn mean(a: &RawReading, b: &RawReading) -> Self {
        Self {
            slope_distance_mm: (a.slope_distance_mm + b.slope_distance_mm) / 2.0,
            vertical_angle_deg: (a.vertical_angle_deg + b.vertical_angle_deg) / 2.0,
            horizontal_angle_deg: (a.horizontal_angle_deg + b.horizontal_angle_deg) / 2.0,
        }
    }
}

// ── Calibration (C5 data model, also the persistence DTO) ─────────────────

/// Record of the most recent edge check. Valid only while the owning
/// `Calibration` remains unreset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeVerification {
    /// Measured radius, metres.
    pub measured_radius_m: f64,
    /// Signed difference from target radius, millimetres (measured - target).
    pub diff_mm: f64,
    /// Tolerance applied, millimetres.
    pub tolerance_mm: f64,
    pub in_tolerance: bool,
}

/// Authoritative per-device calibration state. Also the on-disk persistence
/// shape (§4.5): a flat key-per-device record, reload-tolerant of missing
/// optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    pub device_id: String,
    pub circle_type: CircleType,
    pub target_radius_m: f64,
    /// Station (EDM) coordinates relative to circle centre, metres.
    pub station: Point,
    pub centre_set: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub edge: Option<EdgeVerification>,
    /// ISO-8601 timestamp of the last `SetCentre`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_centre_set_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sector_point: Option<Point>,
}

impl Calibration {
    /// A fresh record for `device_id` with `circle_type` selected: station
    /// zeroed, no centre, no edge.
    pub fn fresh(device_id: impl Into<String>, circle_type: CircleType) -> Self {
        Self {
            device_id: device_id.into(),
            circle_type,
            target_radius_m: circle_type.target_radius_m(),
            station: Point::default(),
            centre_set: false,
            edge: None,
            last_centre_set_at: None,
            sector_point: None,
        }
    }

    /// Whether a throw/sector measurement is legal under this calibration
    /// (demo mode may waive the edge requirement; see orchestrator).
    pub fn is_measurement_ready(&self) -> bool {
        self.centre_set && self.edge.is_some_and(|e| e.in_tolerance)
    }
}
