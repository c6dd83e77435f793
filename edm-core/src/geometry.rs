//! Polar-to-Cartesian geometry engine (C4).
//!
//! Horizontal distance is always computed via the 90°-subtraction form
//! (`sd · cos(90° − va)`), never simplified to `sd · sin(va)`, so the
//! zenith convention for `va` cannot silently drift if the formula is
//! later "simplified".

use edm_types::{AveragedReading, CircleType, EdgeVerification, Point, SECTOR_ANGLE_DEG};

/// Horizontal distance in metres from a slope-distance (mm) / vertical-angle
/// (deg, from zenith) pair.
pub fn horizontal_distance_m(slope_distance_mm: f64, vertical_angle_deg: f64) -> f64 {
    let sd_m = slope_distance_mm / 1000.0;
    let va_rad = vertical_angle_deg.to_radians();
    sd_m * (std::f64::consts::FRAC_PI_2 - va_rad).cos()
}

/// Station coordinates derived from a centre reading: the EDM's position
/// relative to the circle centre (origin).
pub fn station_from_centre(reading: &AveragedReading) -> Point {
    let hd = horizontal_distance_m(reading.slope_distance_mm, reading.vertical_angle_deg);
    let har_rad = reading.horizontal_angle_deg.to_radians();
    Point::new(-hd * har_rad.cos(), -hd * har_rad.sin())
}

/// Absolute point (circle-centre frame) for any other reading, given the
/// current station.
pub fn absolute_point(station: Point, reading: &AveragedReading) -> Point {
    let hd = horizontal_distance_m(reading.slope_distance_mm, reading.vertical_angle_deg);
    let har_rad = reading.horizontal_angle_deg.to_radians();
    let dx = hd * har_rad.cos();
    let dy = hd * har_rad.sin();
    station.translate(dx, dy)
}

/// Edge verification from an edge reading against the canonical target
/// radius/tolerance for `circle_type`.
pub fn edge_verification(
    station: Point,
    reading: &AveragedReading,
    circle_type: CircleType,
) -> EdgeVerification {
    let p_e = absolute_point(station, reading);
    let measured_radius_m = p_e.norm();
    let target = circle_type.target_radius_m();
    let diff_mm = (measured_radius_m - target) * 1000.0;
    let tolerance_mm = circle_type.tolerance_mm();
    EdgeVerification {
        measured_radius_m,
        diff_mm,
        tolerance_mm,
        in_tolerance: diff_mm.abs() <= tolerance_mm,
    }
}

/// Throw measurement: the absolute landing point and the legal throw
/// distance (may be negative; the caller decides validity).
pub fn throw_measurement(
    station: Point,
    reading: &AveragedReading,
    target_radius_m: f64,
) -> (Point, f64) {
    let p_t = absolute_point(station, reading);
    let d = p_t.norm();
    (p_t, d - target_radius_m)
}

/// Sector check: absolute point, bearing, distance from centre, and
/// distance beyond the target radius.
pub struct SectorCheck {
    pub point: Point,
    pub angle_deg: f64,
    pub distance_from_centre_m: f64,
    pub distance_beyond_edge_m: f64,
}

pub fn sector_check(station: Point, reading: &AveragedReading, target_radius_m: f64) -> SectorCheck {
    let p_s = absolute_point(station, reading);
    let distance_from_centre_m = p_s.norm();
    SectorCheck {
        angle_deg: p_s.angle_deg(),
        distance_from_centre_m,
        distance_beyond_edge_m: distance_from_centre_m - target_radius_m,
        point: p_s,
    }
}

/// The left-hand sector line, derived by rotating the right-hand sector
/// point by the standard sector angle. Not applicable to the javelin arc.
pub fn left_hand_sector(right_hand_point: Point) -> Point {
    right_hand_point.rotate_deg(SECTOR_ANGLE_DEG)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(sd_mm: f64, va_deg: f64, har_deg: f64) -> AveragedReading {
        AveragedReading {
            slope_distance_mm: sd_mm,
            vertical_angle_deg: va_deg,
            horizontal_angle_deg: har_deg,
        }
    }

    /// Build the reading that `absolute_point(station, _)` maps exactly back
    /// onto `target`, by solving the forward transform backwards (va fixed
    /// at zenith 90 deg, so `cos(90-va) == 1` and `sd_mm == hd * 1000`).
    fn reading_for(station: Point, target: Point) -> AveragedReading {
        let dx = target.x - station.x;
        let dy = target.y - station.y;
        let hd = (dx * dx + dy * dy).sqrt();
        let mut har_deg = dy.atan2(dx).to_degrees();
        if har_deg < 0.0 {
            har_deg += 360.0;
        }
        reading(hd * 1000.0, 90.0, har_deg)
    }

    #[test]
    fn happy_path_shot_put_centre() {
        // Raw frame 0008390 1001021 3080834 83
        let r = reading(8390.0, 100.172500, 308.142778);
        let hd = horizontal_distance_m(r.slope_distance_mm, r.vertical_angle_deg);
        // 8.390 * sin(100.1725 deg) = 8.390 * 0.9842806 = 8.25815
        assert!((hd - 8.2582).abs() < 1e-3);

        let station = station_from_centre(&r);
        assert!((station.x - (-5.1004)).abs() < 1e-2);
        assert!((station.y - 6.4948).abs() < 1e-2);
    }

    #[test]
    fn edge_pass_within_tolerance() {
        let station = Point::new(-5.1004, 6.4948);
        let p_e = Point::new(0.9900, 0.4000);
        let r = reading_for(station, p_e);
        let edge = edge_verification(station, &r, CircleType::Shot);
        assert!((edge.measured_radius_m - p_e.norm()).abs() < 1e-9);
        assert!((edge.diff_mm - 0.2).abs() < 0.5);
        assert!(edge.in_tolerance);
    }

    #[test]
    fn edge_fail_outside_tolerance() {
        let station = Point::new(-5.1004, 6.4948);
        let p_e = Point::new(1.0500, 0.4000);
        let r = reading_for(station, p_e);
        let edge = edge_verification(station, &r, CircleType::Shot);
        assert!((edge.diff_mm - 56.1).abs() < 0.5);
        assert!(!edge.in_tolerance);
    }

    #[test]
    fn throw_distance_matches_worked_example() {
        let p_t = Point::new(2.34, 15.12);
        let d = p_t.norm();
        assert!((d - 15.2999).abs() < 1e-3);
        let distance = d - CircleType::Shot.target_radius_m();
        assert!((distance - 14.2324).abs() < 1e-3);
    }

    #[test]
    fn tolerance_gate_boundary() {
        let diff = 4.5;
        assert!(diff.abs() <= CircleType::Shot.tolerance_mm());
        let diff = 5.6;
        assert!(diff.abs() > CircleType::Shot.tolerance_mm());
    }

    #[test]
    fn left_hand_sector_rotates_by_standard_angle() {
        let p_s = Point::new(10.0, 0.0);
        let p_left = left_hand_sector(p_s);
        assert!((p_left.norm() - p_s.norm()).abs() < 1e-9);
        assert!((p_left.angle_deg() - SECTOR_ANGLE_DEG).abs() < 1e-6);
    }
}
