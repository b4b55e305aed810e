use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Angle between two vectors, in radians within `[0, π]`.
///
/// Returns `NaN` when either vector has zero length.
pub fn angle(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let norms = a.norm() * b.norm();
    if norms == 0.0 {
        return f64::NAN;
    }
    (a.dot(b) / norms).clamp(-1.0, 1.0).acos()
}

/// Signed dihedral angle defined by four points, in radians within `(-π, π]`.
///
/// Follows the IUPAC convention: eclipsed (cis) is 0 and anti (trans) is π.
/// Returns `NaN` when three consecutive points are collinear.
pub fn dihedral(positions: &[Point3<f64>; 4]) -> f64 {
    let b1 = positions[1] - positions[0];
    let b2 = positions[2] - positions[1];
    let b3 = positions[3] - positions[2];

    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    if n1.norm_squared() == 0.0 || n2.norm_squared() == 0.0 {
        return f64::NAN;
    }

    let x = n1.dot(&n2);
    let y = b2.norm() * b1.dot(&n2);
    wrap_radians(y.atan2(x))
}

/// Dihedral angle shifted by π and wrapped back into `(-π, π]`.
pub fn dihedral_phase(positions: &[Point3<f64>; 4]) -> f64 {
    wrap_radians(dihedral(positions) - PI)
}

fn wrap_radians(mut angle: f64) -> f64 {
    if angle.is_nan() {
        return angle;
    }
    while angle <= -PI {
        angle += 2.0 * PI;
    }
    while angle > PI {
        angle -= 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn angle_between_orthogonal_vectors_is_right() {
        let result = angle(&Vector3::x(), &Vector3::y());
        assert!(f64_approx_equal(result, PI / 2.0));
    }

    #[test]
    fn angle_between_opposite_vectors_is_straight() {
        let result = angle(&Vector3::new(2.0, 0.0, 0.0), &Vector3::new(-1.0, 0.0, 0.0));
        assert!(f64_approx_equal(result, PI));
    }

    #[test]
    fn angle_with_zero_vector_is_nan() {
        assert!(angle(&Vector3::zeros(), &Vector3::x()).is_nan());
    }

    #[test]
    fn trans_dihedral_is_pi() {
        let positions = [
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, -1.0, 0.0),
        ];
        assert!(f64_approx_equal(dihedral(&positions), PI));
    }

    #[test]
    fn cis_dihedral_is_zero() {
        let positions = [
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        assert!(f64_approx_equal(dihedral(&positions), 0.0));
    }

    #[test]
    fn dihedral_sign_follows_handedness() {
        let plus = [
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
        ];
        let minus = [
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, -1.0),
        ];
        let a = dihedral(&plus);
        let b = dihedral(&minus);
        assert!(f64_approx_equal(a.abs(), PI / 2.0));
        assert!(f64_approx_equal(a, -b));
    }

    #[test]
    fn collinear_dihedral_is_nan() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        assert!(dihedral(&positions).is_nan());
    }

    #[test]
    fn dihedral_phase_shifts_by_pi() {
        let cis = [
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let trans = [
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, -1.0, 0.0),
        ];
        assert!(f64_approx_equal(dihedral_phase(&cis), PI));
        assert!(f64_approx_equal(dihedral_phase(&trans), 0.0));
    }

    #[test]
    fn wrap_radians_keeps_the_upper_bound() {
        assert!(f64_approx_equal(wrap_radians(-PI), PI));
        assert!(f64_approx_equal(wrap_radians(3.0 * PI), PI));
        assert!(f64_approx_equal(wrap_radians(0.5), 0.5));
    }
}
