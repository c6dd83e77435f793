//! Demo generator (C7): deterministic-enough synthetic readings consistent
//! with a simulated station position, so the Orchestrator can be exercised
//! without a physical total station.
//!
//! Readings are synthesised by solving the geometry engine's forward
//! transform backwards: given the target absolute point, the slope
//! distance is chosen so that `horizontal_distance_m` reproduces the exact
//! horizontal distance regardless of the (jittered) vertical angle. This
//! keeps the noise-free variant exact (§8's round-trip laws) while still
//! letting the noisy variant perturb the final position by a few
//! millimetres, the way a real prism reading would.

use std::collections::HashMap;
use std::sync::Mutex;

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};

use edm_types::{AveragedReading, CircleType, Point};

/// Station established on first use, at 8-15 m from the centre.
const STATION_RADIUS_RANGE: (f64, f64) = (8.0, 15.0);

/// Horizontal-position jitter applied to synthesised readings, metres.
const JITTER_STD_M: f64 = 0.0015;
/// Vertical-angle jitter, degrees; compensated in slope distance so it
/// never affects the reconstructed horizontal distance.
const VA_JITTER_STD_DEG: f64 = 0.05;

fn throw_range_m(circle_type: CircleType) -> (f64, f64) {
    match circle_type {
        CircleType::Shot => (8.0, 18.0),
        CircleType::Discus => (25.0, 65.0),
        CircleType::Hammer => (20.0, 75.0),
        CircleType::JavelinArc => (35.0, 85.0),
    }
}

#[derive(Debug, Clone, Copy)]
struct DemoDeviceState {
    station: Point,
}

#[derive(Default)]
pub struct DemoGenerator {
    devices: Mutex<HashMap<String, DemoDeviceState>>,
}

impl DemoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Station position for `device_id`, choosing one the first time the
    /// device is used.
    pub fn station(&self, device_id: &str) -> Point {
        let mut guard = self.devices.lock().unwrap();
        guard
            .entry(device_id.to_string())
            .or_insert_with(|| {
                let mut rng = rand::thread_rng();
                let r = Uniform::new(STATION_RADIUS_RANGE.0, STATION_RADIUS_RANGE.1).sample(&mut rng);
                let bearing_deg: f64 = rng.gen_range(0.0..360.0);
                let bearing_rad = bearing_deg.to_radians();
                DemoDeviceState {
                    station: Point::new(r * bearing_rad.cos(), r * bearing_rad.sin()),
                }
            })
            .station
    }

    /// A centre reading that, through the real Geometry Engine, yields the
    /// station position established for this device.
    pub fn centre_reading(&self, device_id: &str, jitter: bool) -> AveragedReading {
        let station = self.station(device_id);
        let target = Point::new(-station.x, -station.y);
        encode_point(Point::default(), target, jitter)
    }

    /// An edge reading landing at the canonical target radius for
    /// `circle_type`, at a random bearing around the circle.
    pub fn edge_reading(&self, device_id: &str, circle_type: CircleType, jitter: bool) -> AveragedReading {
        let station = self.station(device_id);
        let radius = circle_type.target_radius_m();
        let point = random_point_at_radius(radius);
        encode_point(station, point, jitter)
    }

    /// A throw reading at a plausible distance for `circle_type`.
    pub fn throw_reading(&self, device_id: &str, circle_type: CircleType, jitter: bool) -> AveragedReading {
        let station = self.station(device_id);
        let (lo, hi) = throw_range_m(circle_type);
        let mut rng = rand::thread_rng();
        let throw_distance = Uniform::new(lo, hi).sample(&mut rng);
        let total_radius = circle_type.target_radius_m() + throw_distance;
        let point = random_point_at_radius(total_radius);
        encode_point(station, point, jitter)
    }

    /// A sector-line reading, at the target radius on a fixed bearing
    /// (the conventional right-hand sector mark).
    pub fn sector_reading(&self, device_id: &str, circle_type: CircleType, jitter: bool) -> AveragedReading {
        let station = self.station(device_id);
        let radius = circle_type.target_radius_m();
        let half_sector_rad = (edm_types::SECTOR_ANGLE_DEG / 2.0).to_radians();
        let point = Point::new(radius * half_sector_rad.cos(), radius * half_sector_rad.sin());
        encode_point(station, point, jitter)
    }
}

fn random_point_at_radius(radius: f64) -> Point {
    let mut rng = rand::thread_rng();
    let bearing_deg: f64 = rng.gen_range(0.0..360.0);
    let bearing_rad = bearing_deg.to_radians();
    Point::new(radius * bearing_rad.cos(), radius * bearing_rad.sin())
}

/// Encode a reading that, when passed through `absolute_point(from, reading)`,
/// yields `to` (noise-free), or `to` perturbed by a few millimetres (jittered).
fn encode_point(from: Point, to: Point, jitter: bool) -> AveragedReading {
    let mut rng = rand::thread_rng();

    let target = if jitter {
        let noise = Normal::new(0.0, JITTER_STD_M).unwrap();
        Point::new(to.x + noise.sample(&mut rng), to.y + noise.sample(&mut rng))
    } else {
        to
    };

    let dx = target.x - from.x;
    let dy = target.y - from.y;
    let hd = (dx * dx + dy * dy).sqrt();
    let har_deg = normalize_degrees(dy.atan2(dx).to_degrees());

    let va_deg = if jitter {
        90.0 + Normal::new(0.0, VA_JITTER_STD_DEG).unwrap().sample(&mut rng)
    } else {
        90.0
    };
    let va_rad = va_deg.to_radians();
    // Solve for the slope distance that reproduces `hd` exactly under this
    // (possibly jittered) vertical angle.
    let sd_mm = hd * 1000.0 / (std::f64::consts::FRAC_PI_2 - va_rad).cos();

    AveragedReading {
        slope_distance_mm: sd_mm,
        vertical_angle_deg: va_deg,
        horizontal_angle_deg: har_deg,
    }
}

fn normalize_degrees(deg: f64) -> f64 {
    let mut d = deg % 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;

    #[test]
    fn centre_reading_reproduces_station_noise_free() {
        let gen = DemoGenerator::new();
        let station = gen.station("dev-1");
        let reading = gen.centre_reading("dev-1", false);
        let reconstructed = geometry::station_from_centre(&reading);
        assert!((reconstructed.x - station.x).abs() < 1e-3);
        assert!((reconstructed.y - station.y).abs() < 1e-3);
    }

    #[test]
    fn edge_reading_hits_target_radius_noise_free() {
        let gen = DemoGenerator::new();
        let station = gen.station("dev-2");
        let reading = gen.edge_reading("dev-2", CircleType::Shot, false);
        let edge = geometry::edge_verification(station, &reading, CircleType::Shot);
        assert!(edge.in_tolerance);
        assert!((edge.measured_radius_m - CircleType::Shot.target_radius_m()).abs() < 1e-3);
    }

    #[test]
    fn jittered_edge_reading_stays_within_a_few_millimetres() {
        let gen = DemoGenerator::new();
        let station = gen.station("dev-3");
        let reading = gen.edge_reading("dev-3", CircleType::Discus, true);
        let edge = geometry::edge_verification(station, &reading, CircleType::Discus);
        assert!((edge.measured_radius_m - CircleType::Discus.target_radius_m()).abs() < 0.01);
    }

    #[test]
    fn throw_reading_lands_in_plausible_range() {
        let gen = DemoGenerator::new();
        let station = gen.station("dev-4");
        let reading = gen.throw_reading("dev-4", CircleType::Hammer, false);
        let (_, distance) = geometry::throw_measurement(station, &reading, CircleType::Hammer.target_radius_m());
        assert!(distance >= 19.9 && distance <= 75.1);
    }

    #[test]
    fn station_is_stable_across_calls() {
        let gen = DemoGenerator::new();
        let a = gen.station("dev-5");
        let b = gen.station("dev-5");
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, b.y);
    }
}
