//! Prescribed time functions for driven coordinates.

use serde::{Deserialize, Serialize};

/// A scalar function of time used to drive a constrained coordinate instead
/// of leaving it free.
///
/// [`DriverFunction::eval`] returns the value together with its first and
/// second time derivatives, which the constraint evaluator needs for the
/// velocity- and acceleration-level right-hand sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DriverFunction {
    /// Cubic polynomial `c0 + c1·t + c2·t² + c3·t³`, held constant at its
    /// end value for `t > t_end`.
    TypeA {
        /// End of the polynomial segment in s.
        t_end: f64,
        /// Polynomial coefficients `[c0, c1, c2, c3]`.
        c: [f64; 4],
    },

    /// Linear ramp from `v_start` at `t_start` to `v_end` at `t_end`,
    /// clamped to the endpoint values outside the ramp interval.
    TypeB {
        /// Start of the ramp in s.
        t_start: f64,
        /// End of the ramp in s.
        t_end: f64,
        /// Value before and at `t_start`.
        v_start: f64,
        /// Value at and after `t_end`.
        v_end: f64,
    },

    /// Smooth start-up: holds `v_start` until `t_start`, then blends with a
    /// cubic whose rate grows from zero to `d_end` at `t_end` (value and
    /// first derivative continuous at both boundaries), and continues at
    /// the constant rate `d_end` afterwards.
    TypeC {
        /// Start of the blend in s.
        t_start: f64,
        /// End of the blend in s.
        t_end: f64,
        /// Rest value held before the blend.
        v_start: f64,
        /// Rate reached at the end of the blend, in value-units/s.
        d_end: f64,
    },
}

impl DriverFunction {
    /// Evaluate the function at time `t`, returning `(f, f', f'')`.
    #[must_use]
    pub fn eval(&self, t: f64) -> (f64, f64, f64) {
        match *self {
            Self::TypeA { t_end, c } => {
                let tc = t.min(t_end);
                let f = c[0] + c[1] * tc + c[2] * tc * tc + c[3] * tc * tc * tc;
                if t > t_end {
                    (f, 0.0, 0.0)
                } else {
                    let f_d = c[1] + 2.0 * c[2] * tc + 3.0 * c[3] * tc * tc;
                    let f_dd = 2.0 * c[2] + 6.0 * c[3] * tc;
                    (f, f_d, f_dd)
                }
            }
            Self::TypeB {
                t_start,
                t_end,
                v_start,
                v_end,
            } => {
                if t <= t_start {
                    (v_start, 0.0, 0.0)
                } else if t >= t_end {
                    (v_end, 0.0, 0.0)
                } else {
                    let slope = (v_end - v_start) / (t_end - t_start);
                    (v_start + slope * (t - t_start), slope, 0.0)
                }
            }
            Self::TypeC {
                t_start,
                t_end,
                v_start,
                d_end,
            } => {
                let span = t_end - t_start;
                if t <= t_start {
                    (v_start, 0.0, 0.0)
                } else if t < t_end {
                    // f = v_start + d_end·(t-ts)³/(3·span²)
                    // so f'(ts) = 0, f'(te) = d_end, f''(ts) = 0.
                    let dt = t - t_start;
                    let f = v_start + d_end * dt * dt * dt / (3.0 * span * span);
                    let f_d = d_end * dt * dt / (span * span);
                    let f_dd = 2.0 * d_end * dt / (span * span);
                    (f, f_d, f_dd)
                } else {
                    let v_end = v_start + d_end * span / 3.0;
                    (v_end + d_end * (t - t_end), d_end, 0.0)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn type_a_polynomial_and_derivatives() {
        let f = DriverFunction::TypeA {
            t_end: 2.0,
            c: [1.0, 2.0, 3.0, 0.5],
        };
        let (v, vd, vdd) = f.eval(1.0);
        assert_relative_eq!(v, 1.0 + 2.0 + 3.0 + 0.5, epsilon = 1e-12);
        assert_relative_eq!(vd, 2.0 + 6.0 + 1.5, epsilon = 1e-12);
        assert_relative_eq!(vdd, 6.0 + 3.0, epsilon = 1e-12);

        // Held constant past t_end.
        let (v_end, _, _) = f.eval(2.0);
        let (v_past, vd_past, _) = f.eval(5.0);
        assert_relative_eq!(v_past, v_end, epsilon = 1e-12);
        assert_eq!(vd_past, 0.0);
    }

    #[test]
    fn type_b_ramp_clamps_outside_interval() {
        let f = DriverFunction::TypeB {
            t_start: 1.0,
            t_end: 3.0,
            v_start: 0.5,
            v_end: 2.5,
        };
        assert_eq!(f.eval(0.0), (0.5, 0.0, 0.0));
        assert_eq!(f.eval(10.0), (2.5, 0.0, 0.0));
        let (v, vd, vdd) = f.eval(2.0);
        assert_relative_eq!(v, 1.5, epsilon = 1e-12);
        assert_relative_eq!(vd, 1.0, epsilon = 1e-12);
        assert_eq!(vdd, 0.0);
    }

    #[test]
    fn type_c_is_c1_continuous_at_both_boundaries() {
        let f = DriverFunction::TypeC {
            t_start: 1.0,
            t_end: 2.0,
            v_start: 4.0,
            d_end: 3.0,
        };
        let eps = 1e-9;

        let (v_lo, vd_lo, _) = f.eval(1.0 - eps);
        let (v_hi, vd_hi, _) = f.eval(1.0 + eps);
        assert_relative_eq!(v_lo, v_hi, epsilon = 1e-6);
        assert_relative_eq!(vd_lo, vd_hi, epsilon = 1e-6);

        let (v_lo, vd_lo, _) = f.eval(2.0 - eps);
        let (v_hi, vd_hi, _) = f.eval(2.0 + eps);
        assert_relative_eq!(v_lo, v_hi, epsilon = 1e-6);
        assert_relative_eq!(vd_lo, vd_hi, epsilon = 1e-6);

        // End rate is reached exactly.
        let (_, vd, _) = f.eval(2.0);
        assert_relative_eq!(vd, 3.0, epsilon = 1e-12);
    }
}
