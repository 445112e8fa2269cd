//! Equations of motion: the augmented mass/constraint system and its solve.
//!
//! At each evaluation the constrained equations of motion are assembled as
//! one saddle-point system
//!
//! ```text
//! [ M   Φ_qᵀ ] [ q̈ ]   [ F ]
//! [ Φ_q  0   ] [ λ ] = [ γ ]
//! ```
//!
//! with the diagonal mass matrix `M = diag(m, m, J)` per body, and solved by
//! row-pivoted LU. The multipliers `λ` come out for free and are kept for
//! reaction-force reporting.

use dap_types::StepError;
use nalgebra::{DMatrix, DVector};

use crate::data::Data;
use crate::model::Model;
use crate::{constraint, force, linalg};

/// Solve for generalized accelerations and Lagrange multipliers at the
/// current state.
///
/// Returns `(q̈, λ)` with `q̈` of length `n_coords` and `λ` of length
/// `n_const`. `last_step` is carried into any error for diagnostics.
///
/// # Errors
///
/// [`StepError::SingularSystem`] when the augmented matrix cannot be
/// factored (redundant or degenerate constraints), and any error from force
/// evaluation.
pub fn solve_accelerations(
    model: &Model,
    data: &Data,
    t: f64,
    last_step: usize,
) -> Result<(DVector<f64>, DVector<f64>), StepError> {
    let nc = model.n_coords;
    let m = model.n_const;
    let n = nc + m;

    let f = force::generalized_forces(model, data, t)?;
    let sys = constraint::evaluate(model, data, t);

    let mut a = DMatrix::zeros(n, n);
    for bi in 0..model.nbody {
        a[(3 * bi, 3 * bi)] = model.body_mass[bi];
        a[(3 * bi + 1, 3 * bi + 1)] = model.body_mass[bi];
        a[(3 * bi + 2, 3 * bi + 2)] = model.body_inertia[bi];
    }
    for row in 0..m {
        for col in 0..nc {
            let j = sys.jac[(row, col)];
            a[(nc + row, col)] = j;
            a[(col, nc + row)] = j;
        }
    }

    let mut rhs = DVector::zeros(n);
    rhs.rows_mut(0, nc).copy_from(&f);
    rhs.rows_mut(nc, m).copy_from(&sys.gamma);

    let mut piv = vec![0usize; n];
    if linalg::lu_factor_in_place(&mut a, &mut piv).is_err() {
        return Err(StepError::SingularSystem {
            last_step,
            time: t,
        });
    }
    linalg::lu_solve_factored(&a, &piv, &mut rhs);

    let q_dd = rhs.rows(0, nc).into_owned();
    let lambda = rhs.rows(nc, m).into_owned();
    Ok((q_dd, lambda))
}
