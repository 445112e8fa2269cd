//! Planar multibody dynamics solver.
//!
//! Body-coordinate formulation: each rigid body carries three generalized
//! coordinates `(r_x, r_y, p)`, joints contribute algebraic constraint rows,
//! and each step solves the augmented mass/constraint system for
//! accelerations and Lagrange multipliers before a fixed-step integrator
//! advances the state.
//!
//! The split mirrors the data flow: a [`ModelDescription`] is batch-loaded
//! and [assembled](ModelDescription::assemble) into an immutable [`Model`],
//! which creates the mutable [`Data`] it is simulated with. [`simulate`]
//! runs the whole configured span and records a [`Trajectory`].
//!
//! ```
//! use dap_core::{simulate, ModelDescription};
//! use dap_types::{BodyInit, Force, SolverConfig};
//! use nalgebra::Vector2;
//!
//! let mut desc = ModelDescription::new(SolverConfig::new(0.5, 0.01));
//! desc.add_body(BodyInit::at_rest(1.0, 0.1, Vector2::new(0.0, 2.0), 0.0));
//! desc.add_force(Force::gravity(Vector2::new(0.0, -9.81)));
//! let model = desc.assemble().expect("valid model");
//! let trajectory = simulate(&model).expect("run completes");
//! assert_eq!(trajectory.len(), model.config.n_steps() + 1);
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]

pub mod assemble;
pub mod constraint;
pub mod data;
pub mod dynamics;
pub mod force;
pub mod integrators;
pub mod kinematics;
mod linalg;
pub mod model;
pub mod recorder;

pub use assemble::ModelDescription;
pub use data::Data;
pub use model::Model;
pub use recorder::{Frame, Trajectory};

use dap_types::StepError;
use tracing::{debug, info};

/// Run the full configured time span, recording one frame per step plus the
/// initial state.
///
/// # Errors
///
/// Any [`StepError`] from the run; the trajectory up to the failure is
/// discarded, use [`simulate_until`] with external recording if partial
/// results matter.
pub fn simulate(model: &Model) -> Result<Trajectory, StepError> {
    simulate_until(model, |_| false)
}

/// Run the configured span with a cooperative abort check between steps.
///
/// `abort` is consulted before each step with the freshly refreshed state;
/// returning `true` stops the run cleanly with the frames recorded so far.
///
/// # Errors
///
/// Any [`StepError`] from force evaluation, the augmented solve, or
/// integration.
pub fn simulate_until(
    model: &Model,
    mut abort: impl FnMut(&Data) -> bool,
) -> Result<Trajectory, StepError> {
    let n_steps = model.config.n_steps();
    info!(
        n_steps,
        dt = model.config.reporting_time_step,
        integrator = ?model.config.integrator,
        "starting simulation"
    );

    let mut data = model.make_data();
    data.refresh(model)?;

    let mut trajectory = Trajectory::with_capacity(n_steps + 1);
    trajectory.record(&data);

    for _ in 0..n_steps {
        if abort(&data) {
            debug!(time = data.time, step = data.step_count, "run aborted");
            return Ok(trajectory);
        }
        data.step(model)?;
        trajectory.record(&data);
    }

    debug!(time = data.time, "simulation complete");
    Ok(trajectory)
}
