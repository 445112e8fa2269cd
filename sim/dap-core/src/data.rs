//! Mutable simulation state.
//!
//! [`Data`] carries everything that changes during integration: body
//! kinematic state, the derived world-frame fields of points and unit
//! vectors, the Lagrange multipliers of the most recent solve, and the
//! energy bookkeeping. The static model it belongs to is passed into each
//! operation, never stored.

use dap_types::{BodyRef, StepError};
use nalgebra::{DVector, Matrix2, Vector2};

use crate::kinematics::{rot, rot90};
use crate::model::Model;
use crate::{dynamics, force, integrators};

/// Dynamic simulation state for one model.
#[derive(Debug, Clone)]
pub struct Data {
    /// Current simulation time in s.
    pub time: f64,
    /// Number of completed integration steps.
    pub step_count: usize,

    // ==================== Body state ====================
    /// Mass-center positions.
    pub r: Vec<Vector2<f64>>,
    /// Orientation angles.
    pub p: Vec<f64>,
    /// Linear velocities.
    pub r_d: Vec<Vector2<f64>>,
    /// Angular velocities.
    pub p_d: Vec<f64>,
    /// Linear accelerations (filled by the most recent solve).
    pub r_dd: Vec<Vector2<f64>>,
    /// Angular accelerations (filled by the most recent solve).
    pub p_dd: Vec<f64>,
    /// Rotation matrices `A = R(p)`, recomputed whenever `p` changes.
    pub rot_mat: Vec<Matrix2<f64>>,

    // ==================== Derived point/unit-vector state ====================
    /// World-frame point offsets `sP = A·sP_local`.
    pub point_s: Vec<Vector2<f64>>,
    /// 90°-rotated offsets `sP_r`, used for velocity propagation.
    pub point_s_r: Vec<Vector2<f64>>,
    /// World point positions `rP = r + sP`.
    pub point_r: Vec<Vector2<f64>>,
    /// World point velocities `rP_d = r_d + sP_r·p_d`.
    pub point_r_d: Vec<Vector2<f64>>,
    /// World unit-vector directions `u = A·u_local`.
    pub uvec_u: Vec<Vector2<f64>>,
    /// Rotated directions `u_r`.
    pub uvec_u_r: Vec<Vector2<f64>>,
    /// Direction rates `u_d = u_r·p_d`.
    pub uvec_u_d: Vec<Vector2<f64>>,

    // ==================== Solver outputs ====================
    /// Lagrange multipliers from the most recent solve.
    pub lambda: DVector<f64>,
    /// Kinetic energy at the current state.
    pub energy_kinetic: f64,
    /// Potential energy (gravity + springs) at the current state.
    pub energy_potential: f64,
}

impl Data {
    /// Recompute every derived world-frame field from the current body
    /// state: rotation matrices, point offsets/positions/velocities, and
    /// unit-vector directions. Ground-anchored entities keep their local
    /// fields as world fields and never move.
    pub fn forward(&mut self, model: &Model) {
        for bi in 0..model.nbody {
            self.rot_mat[bi] = rot(self.p[bi]);
        }
        for pi in 0..model.npoint {
            match model.point_body[pi] {
                BodyRef::Ground => {
                    let s = model.point_s_local[pi];
                    self.point_s[pi] = s;
                    self.point_s_r[pi] = rot90(s);
                    self.point_r[pi] = s;
                    self.point_r_d[pi] = Vector2::zeros();
                }
                BodyRef::Body(bi) => {
                    let s = self.rot_mat[bi] * model.point_s_local[pi];
                    let s_r = rot90(s);
                    self.point_s[pi] = s;
                    self.point_s_r[pi] = s_r;
                    self.point_r[pi] = self.r[bi] + s;
                    self.point_r_d[pi] = self.r_d[bi] + s_r * self.p_d[bi];
                }
            }
        }
        for vi in 0..model.nuvec {
            match model.uvec_body[vi] {
                BodyRef::Ground => {
                    let u = model.uvec_local[vi];
                    self.uvec_u[vi] = u;
                    self.uvec_u_r[vi] = rot90(u);
                    self.uvec_u_d[vi] = Vector2::zeros();
                }
                BodyRef::Body(bi) => {
                    let u = self.rot_mat[bi] * model.uvec_local[vi];
                    let u_r = rot90(u);
                    self.uvec_u[vi] = u;
                    self.uvec_u_r[vi] = u_r;
                    self.uvec_u_d[vi] = u_r * self.p_d[bi];
                }
            }
        }
    }

    /// Advance the state by one fixed reporting step.
    ///
    /// Evaluates forces and constraints, solves the augmented
    /// equation-of-motion system, integrates with the configured method,
    /// then refreshes rotation matrices, dependent point/unit-vector
    /// fields, accelerations, multipliers, and energies at the new state.
    ///
    /// # Errors
    ///
    /// [`StepError::SingularSystem`] if the augmented matrix cannot be
    /// factored, [`StepError::NonFinite`] if NaN or infinity appears in any
    /// integrated quantity; both report the last valid step index.
    pub fn step(&mut self, model: &Model) -> Result<(), StepError> {
        let dt = model.config.reporting_time_step;
        integrators::advance(model, self, dt)?;

        self.step_count += 1;
        // Recompute the time from the step count so long runs don't
        // accumulate summation drift.
        #[allow(clippy::cast_precision_loss)]
        {
            self.time = model.config.t_initial + (self.step_count as f64) * dt;
        }

        if !self.is_finite() {
            return Err(StepError::NonFinite {
                last_step: self.step_count - 1,
                time: self.time,
            });
        }

        self.refresh(model)
    }

    /// Refresh all derived quantities at the current state: world-frame
    /// kinematics, accelerations/multipliers from a fresh solve, and
    /// energies.
    pub(crate) fn refresh(&mut self, model: &Model) -> Result<(), StepError> {
        self.forward(model);
        let last_step = self.step_count.saturating_sub(1);
        let (q_dd, lambda) = dynamics::solve_accelerations(model, self, self.time, last_step)?;
        for bi in 0..model.nbody {
            self.r_dd[bi] = Vector2::new(q_dd[3 * bi], q_dd[3 * bi + 1]);
            self.p_dd[bi] = q_dd[3 * bi + 2];
        }
        self.lambda = lambda;

        self.energy_kinetic = 0.5
            * (0..model.nbody)
                .map(|bi| {
                    model.body_mass[bi] * self.r_d[bi].norm_squared()
                        + model.body_inertia[bi] * self.p_d[bi] * self.p_d[bi]
                })
                .sum::<f64>();
        self.energy_potential = force::potential_energy(model, self, self.time);
        Ok(())
    }

    /// Total mechanical energy (kinetic + potential).
    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.energy_kinetic + self.energy_potential
    }

    // ==================== Body accessors (ground-aware) ====================

    pub(crate) fn body_p(&self, body: BodyRef) -> f64 {
        body.index().map_or(0.0, |i| self.p[i])
    }

    pub(crate) fn body_p_d(&self, body: BodyRef) -> f64 {
        body.index().map_or(0.0, |i| self.p_d[i])
    }

    pub(crate) fn body_r(&self, body: BodyRef) -> Vector2<f64> {
        body.index().map_or(Vector2::zeros(), |i| self.r[i])
    }

    pub(crate) fn body_rot(&self, body: BodyRef) -> Matrix2<f64> {
        body.index().map_or(Matrix2::identity(), |i| self.rot_mat[i])
    }

    // ==================== State vector packing ====================

    /// Pack the body state into the stacked vector `u = [q; q_d]` using
    /// each body's `irc`/`irv` offsets (positions first, then velocities).
    pub(crate) fn pack_state(&self, model: &Model) -> DVector<f64> {
        let mut u = DVector::zeros(2 * model.n_coords);
        for bi in 0..model.nbody {
            let irc = model.body_irc[bi];
            let irv = model.body_irv[bi];
            u[irc] = self.r[bi].x;
            u[irc + 1] = self.r[bi].y;
            u[irc + 2] = self.p[bi];
            u[irv] = self.r_d[bi].x;
            u[irv + 1] = self.r_d[bi].y;
            u[irv + 2] = self.p_d[bi];
        }
        u
    }

    /// Scatter a stacked state vector back into the body arrays.
    pub(crate) fn unpack_state(&mut self, model: &Model, u: &DVector<f64>) {
        for bi in 0..model.nbody {
            let irc = model.body_irc[bi];
            let irv = model.body_irv[bi];
            self.r[bi] = Vector2::new(u[irc], u[irc + 1]);
            self.p[bi] = u[irc + 2];
            self.r_d[bi] = Vector2::new(u[irv], u[irv + 1]);
            self.p_d[bi] = u[irv + 2];
        }
    }

    fn is_finite(&self) -> bool {
        self.r.iter().all(|v| v.x.is_finite() && v.y.is_finite())
            && self.p.iter().all(|p| p.is_finite())
            && self.r_d.iter().all(|v| v.x.is_finite() && v.y.is_finite())
            && self.p_d.iter().all(|p| p.is_finite())
    }
}
