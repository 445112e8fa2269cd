//! Planar kinematics primitives: rotation matrix construction and the 90°
//! rotation operator.
//!
//! Pure math, no state. The 90° operator is the planar analogue of the
//! cross product: for a point fixed at body offset `s`, the world velocity
//! contribution of the body's spin is `rot90(A·s)·p_d`, and `rot90` applied
//! twice negates its argument, which is what turns velocity terms into the
//! centripetal entries of the acceleration right-hand side.

use nalgebra::{Matrix2, Vector2};

/// Rotation matrix for the orientation angle `p` (rad, counterclockwise).
#[must_use]
pub fn rot(p: f64) -> Matrix2<f64> {
    let (s, c) = p.sin_cos();
    Matrix2::new(c, -s, s, c)
}

/// Rotate a vector by +90°: `(x, y) ↦ (-y, x)`.
#[must_use]
pub fn rot90(v: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(-v.y, v.x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotation_matrix_is_orthonormal() {
        for &p in &[0.0, 0.3, -1.2, 3.0] {
            let a = rot(p);
            let should_be_identity = a.transpose() * a;
            assert_relative_eq!(should_be_identity[(0, 0)], 1.0, epsilon = 1e-14);
            assert_relative_eq!(should_be_identity[(0, 1)], 0.0, epsilon = 1e-14);
            assert_relative_eq!(a.determinant(), 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn quarter_turn_matches_rot90() {
        let v = Vector2::new(0.7, -0.2);
        let by_matrix = rot(FRAC_PI_2) * v;
        let by_operator = rot90(v);
        assert_relative_eq!(by_matrix.x, by_operator.x, epsilon = 1e-14);
        assert_relative_eq!(by_matrix.y, by_operator.y, epsilon = 1e-14);
    }

    #[test]
    fn rot90_twice_negates() {
        let v = Vector2::new(1.5, 2.5);
        let w = rot90(rot90(v));
        assert_relative_eq!(w.x, -v.x, epsilon = 1e-14);
        assert_relative_eq!(w.y, -v.y, epsilon = 1e-14);
    }
}
