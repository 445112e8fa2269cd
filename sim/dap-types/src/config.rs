//! Simulation configuration.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Integration method for the fixed-step loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Integrator {
    /// Classical 4th-order Runge-Kutta. Four system solves per step.
    #[default]
    RungeKutta4,
    /// Semi-implicit (symplectic) Euler. One system solve per step; cheaper
    /// but first-order.
    SemiImplicitEuler,
}

/// Time span and stepping configuration for a simulation run.
///
/// The step size is fixed at `reporting_time_step` for the whole run; there
/// is no adaptive step control. Every run with the same inputs produces the
/// same output modulo platform floating-point differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Simulation start time in s.
    pub t_initial: f64,
    /// Simulation end time in s. Must be greater than `t_initial`.
    pub t_final: f64,
    /// Fixed integration and reporting step in s. Must be positive.
    pub reporting_time_step: f64,
    /// Integration method.
    pub integrator: Integrator,
    /// Normal of the plane of motion, in the embedding 3D frame.
    ///
    /// The solver itself works in the plane's local x-y coordinates; the
    /// normal is metadata consumers use to place trajectories back into 3D.
    /// Must be nonzero.
    pub plane_normal: Vector3<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            t_initial: 0.0,
            t_final: 0.5,
            reporting_time_step: 0.01,
            integrator: Integrator::default(),
            plane_normal: Vector3::z(),
        }
    }
}

impl SolverConfig {
    /// Configuration for the span `[0, t_final]` with the given step.
    #[must_use]
    pub fn new(t_final: f64, reporting_time_step: f64) -> Self {
        Self {
            t_final,
            reporting_time_step,
            ..Default::default()
        }
    }

    /// Set the integration method.
    #[must_use]
    pub fn integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Number of integration steps in the run, rounded to cover the span
    /// within floating-point tolerance.
    #[must_use]
    pub fn n_steps(&self) -> usize {
        let span = self.t_final - self.t_initial;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = (span / self.reporting_time_step).round() as usize;
        n.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_covers_span() {
        let cfg = SolverConfig::new(1.0, 0.01);
        assert_eq!(cfg.n_steps(), 100);

        // Rounding absorbs floating-point drift in the quotient.
        let cfg = SolverConfig::new(0.3, 0.1);
        assert_eq!(cfg.n_steps(), 3);
    }
}
