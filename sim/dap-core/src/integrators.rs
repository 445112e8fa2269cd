//! Fixed-step time integration.
//!
//! Two methods over the stacked state vector `u = [q; q̇]`:
//!
//! - Classic Runge-Kutta 4 (the default): four derivative evaluations per
//!   step, each one a full force/constraint assembly and augmented solve at
//!   the intermediate state.
//! - Semi-implicit Euler: one solve per step, reusing the accelerations
//!   already computed at the step's start; velocities update first and the
//!   new velocities advance the positions. Cheaper and better at holding
//!   oscillatory energy than explicit Euler, at first-order accuracy.

use dap_types::{Integrator, StepError};
use nalgebra::DVector;

use crate::data::Data;
use crate::dynamics;
use crate::model::Model;

/// Advance the body state by one step of size `dt` with the configured
/// method. Derived point/unit-vector fields are left stale; the caller
/// refreshes them afterwards.
///
/// # Errors
///
/// Propagates any failure of the intermediate force/constraint solves.
pub(crate) fn advance(model: &Model, data: &mut Data, dt: f64) -> Result<(), StepError> {
    match model.config.integrator {
        Integrator::RungeKutta4 => rk4(model, data, dt),
        Integrator::SemiImplicitEuler => {
            semi_implicit_euler(model, data, dt);
            Ok(())
        }
    }
}

/// Time derivative of the stacked state: `du = [q̇; q̈]` with `q̈` from a
/// fresh augmented solve at the state in `u`.
fn derivative(
    model: &Model,
    scratch: &mut Data,
    u: &DVector<f64>,
    t: f64,
    last_step: usize,
) -> Result<DVector<f64>, StepError> {
    scratch.unpack_state(model, u);
    scratch.forward(model);
    let (q_dd, _) = dynamics::solve_accelerations(model, scratch, t, last_step)?;

    let nc = model.n_coords;
    let mut du = DVector::zeros(2 * nc);
    for k in 0..nc {
        du[k] = u[nc + k];
        du[nc + k] = q_dd[k];
    }
    Ok(du)
}

fn rk4(model: &Model, data: &mut Data, dt: f64) -> Result<(), StepError> {
    let t = data.time;
    let last_step = data.step_count;
    let u0 = data.pack_state(model);

    // Scratch state for intermediate evaluations; body arrays get
    // overwritten by unpack, derived fields by forward.
    let mut scratch = data.clone();

    let k1 = derivative(model, &mut scratch, &u0, t, last_step)?;
    let k2 = derivative(
        model,
        &mut scratch,
        &(&u0 + &k1 * (dt / 2.0)),
        t + dt / 2.0,
        last_step,
    )?;
    let k3 = derivative(
        model,
        &mut scratch,
        &(&u0 + &k2 * (dt / 2.0)),
        t + dt / 2.0,
        last_step,
    )?;
    let k4 = derivative(model, &mut scratch, &(&u0 + &k3 * dt), t + dt, last_step)?;

    let u1 = u0 + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0);
    data.unpack_state(model, &u1);
    Ok(())
}

/// Velocities first from the stored accelerations, then positions from the
/// updated velocities.
fn semi_implicit_euler(model: &Model, data: &mut Data, dt: f64) {
    for bi in 0..model.nbody {
        data.r_d[bi] += data.r_dd[bi] * dt;
        data.p_d[bi] += data.p_dd[bi] * dt;
        data.r[bi] += data.r_d[bi] * dt;
        data.p[bi] += data.p_d[bi] * dt;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assemble::ModelDescription;
    use approx::assert_relative_eq;
    use dap_types::{BodyInit, Force, SolverConfig};
    use nalgebra::Vector2;

    fn projectile_description(integrator: Integrator) -> ModelDescription {
        let mut config = SolverConfig::new(1.0, 0.01);
        config.integrator = integrator;
        let mut desc = ModelDescription::new(config);
        desc.add_body(
            BodyInit::at_rest(1.0, 0.1, Vector2::zeros(), 0.0)
                .with_velocity(Vector2::new(3.0, 4.0), 0.5),
        );
        desc.add_force(Force::gravity(Vector2::new(0.0, -9.81)));
        desc
    }

    #[test]
    fn rk4_reproduces_ballistic_arc_exactly() {
        // Constant acceleration is a polynomial of degree 2 in t; RK4 is
        // exact on it up to roundoff.
        let model = projectile_description(Integrator::RungeKutta4)
            .assemble()
            .expect("assembly failed");
        let mut data = model.make_data();
        data.refresh(&model).unwrap();
        for _ in 0..100 {
            data.step(&model).unwrap();
        }
        let t = data.time;
        assert_relative_eq!(data.r[0].x, 3.0 * t, epsilon = 1e-10);
        assert_relative_eq!(data.r[0].y, 4.0 * t - 0.5 * 9.81 * t * t, epsilon = 1e-10);
        assert_relative_eq!(data.p[0], 0.5 * t, epsilon = 1e-10);
    }

    #[test]
    fn semi_implicit_euler_converges_to_ballistic_arc() {
        let model = projectile_description(Integrator::SemiImplicitEuler)
            .assemble()
            .expect("assembly failed");
        let mut data = model.make_data();
        data.refresh(&model).unwrap();
        for _ in 0..100 {
            data.step(&model).unwrap();
        }
        let t = data.time;
        // First-order method: looser tolerance, scaled by the step size.
        assert_relative_eq!(data.r[0].x, 3.0 * t, epsilon = 1e-9);
        assert_relative_eq!(data.r[0].y, 4.0 * t - 0.5 * 9.81 * t * t, epsilon = 0.1);
    }
}
