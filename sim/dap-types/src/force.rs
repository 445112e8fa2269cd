//! Applied force elements.

use crate::BodyRef;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A force element acting on one or more bodies.
///
/// Each variant carries only the coefficients its evaluation needs. A zero
/// damping coefficient turns a spring-damper into a pure spring, so the
/// linear and rotational spring/damper pairs collapse into two parametric
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Force {
    /// Uniform gravity applied to every body, `f_i = m_i · g · weight_scale`.
    Gravity {
        /// Gravitational acceleration vector in m/s² (e.g. `(0, -9.81)`).
        g: Vector2<f64>,
        /// Dimensionless scaling factor applied to every body's weight.
        weight_scale: f64,
    },

    /// Linear spring-damper acting along the line between two anchor points.
    ///
    /// Force magnitude `k·(ℓ - ℓ0) + c·ℓ̇`, applied as equal-and-opposite
    /// forces on the two connected bodies with the corresponding moment arm
    /// about each body's mass center.
    PointToPoint {
        /// Anchor point on the first body (index into the point registry).
        i_point: usize,
        /// Anchor point on the second body.
        j_point: usize,
        /// Stiffness `k` in N/m. Non-negative.
        stiffness: f64,
        /// Damping coefficient `c` in N·s/m. Non-negative.
        damping: f64,
        /// Undeformed length `ℓ0` in m.
        undeformed_length: f64,
        /// Optional driver function (index into the driver registry) that
        /// replaces `ℓ0` with a prescribed `f(t)`.
        length_driver: Option<usize>,
    },

    /// Rotational spring-damper acting on the relative angle of two bodies.
    ///
    /// Torque magnitude `k_θ·(θ - θ0) + c_θ·θ̇` with `θ = p_i - p_j`,
    /// applied as equal-and-opposite moments.
    Rotational {
        /// First body (or ground).
        i_body: BodyRef,
        /// Second body (or ground).
        j_body: BodyRef,
        /// Stiffness `k_θ` in N·m/rad. Non-negative.
        stiffness: f64,
        /// Damping coefficient `c_θ` in N·m·s/rad. Non-negative.
        damping: f64,
        /// Undeformed relative angle `θ0` in rad.
        undeformed_angle: f64,
        /// Optional driver function that replaces `θ0` with `f(t)`.
        angle_driver: Option<usize>,
    },
}

impl Force {
    /// Linear spring with no damping.
    #[must_use]
    pub fn spring(i_point: usize, j_point: usize, stiffness: f64, undeformed_length: f64) -> Self {
        Self::PointToPoint {
            i_point,
            j_point,
            stiffness,
            damping: 0.0,
            undeformed_length,
            length_driver: None,
        }
    }

    /// Uniform gravity with unit weight scaling.
    #[must_use]
    pub fn gravity(g: Vector2<f64>) -> Self {
        Self::Gravity {
            g,
            weight_scale: 1.0,
        }
    }
}

/// Damping classification of a spring-damper relative to critical damping.
///
/// This is a display-only derived value for user feedback; it has no effect
/// on the integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DampingCondition {
    /// No damping (`c = 0`).
    Undamped,
    /// `c < c_critical`: oscillatory decay.
    Underdamped,
    /// `c = c_critical`: fastest non-oscillatory decay.
    CriticallyDamped,
    /// `c > c_critical`: slow non-oscillatory decay.
    Overdamped,
}

/// Classify a damping coefficient against critical damping
/// `c_crit = 2·sqrt(k·m)` for the given stiffness and effective mass.
///
/// Returns [`DampingCondition::Undamped`] when either `k` or `m` is
/// non-positive, since critical damping is then undefined.
#[must_use]
pub fn damping_condition(damping: f64, stiffness: f64, effective_mass: f64) -> DampingCondition {
    if damping <= 0.0 || stiffness <= 0.0 || effective_mass <= 0.0 {
        return DampingCondition::Undamped;
    }
    let c_crit = 2.0 * (stiffness * effective_mass).sqrt();
    let ratio = damping / c_crit;
    if ratio < 1.0 {
        DampingCondition::Underdamped
    } else if ratio > 1.0 {
        DampingCondition::Overdamped
    } else {
        DampingCondition::CriticallyDamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damping_classification() {
        // k = 4, m = 1 => c_crit = 4
        assert_eq!(
            damping_condition(2.0, 4.0, 1.0),
            DampingCondition::Underdamped
        );
        assert_eq!(
            damping_condition(4.0, 4.0, 1.0),
            DampingCondition::CriticallyDamped
        );
        assert_eq!(
            damping_condition(8.0, 4.0, 1.0),
            DampingCondition::Overdamped
        );
        assert_eq!(damping_condition(0.0, 4.0, 1.0), DampingCondition::Undamped);
        assert_eq!(damping_condition(1.0, 0.0, 1.0), DampingCondition::Undamped);
    }

    #[test]
    fn spring_constructor_has_zero_damping() {
        let f = Force::spring(0, 1, 100.0, 0.5);
        match f {
            Force::PointToPoint {
                damping,
                length_driver,
                ..
            } => {
                assert_eq!(damping, 0.0);
                assert!(length_driver.is_none());
            }
            _ => panic!("expected PointToPoint"),
        }
    }
}
