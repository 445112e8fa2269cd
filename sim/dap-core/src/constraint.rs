//! Constraint evaluation: residuals, Jacobian blocks, and the
//! acceleration-level right-hand side.
//!
//! For the current body states this produces the residual vector `Φ(q, t)`,
//! the Jacobian `Φ_q` (sparse by construction: nonzero only in each joint's
//! assigned column range), and the bias `γ` such that the acceleration-level
//! constraint equations read `Φ_q·q̈ = γ`. Each joint owns a contiguous row
//! range assigned at assembly time in registration order.
//!
//! Angle differences are used raw, without ±π wrap-around, consistent with
//! the body-coordinate DAP formulation: configurations whose relative
//! rotations traverse the ±π discontinuity are outside the formulation's
//! validity and are a documented limitation, not something to normalize
//! away.

use dap_types::{BodyRef, Joint};
use nalgebra::{DMatrix, DVector, Vector2};

use crate::data::Data;
use crate::kinematics::rot90;
use crate::model::Model;

/// Constraint residuals, Jacobian, and acceleration bias at one state.
#[derive(Debug, Clone)]
pub struct ConstraintSystem {
    /// Residual vector `Φ`, length `n_const`.
    pub phi: DVector<f64>,
    /// Jacobian `Φ_q`, `n_const × n_coords`.
    pub jac: DMatrix<f64>,
    /// Acceleration-level right-hand side `γ`, length `n_const`.
    pub gamma: DVector<f64>,
}

/// Kinematic quantities of one anchor point, with ground folded in.
struct PointKin {
    body: BodyRef,
    /// World-frame offset from the mass center, `sP`.
    s: Vector2<f64>,
    /// 90°-rotated offset, `sP_r`.
    s_r: Vector2<f64>,
    /// World position `rP`.
    r: Vector2<f64>,
    /// World velocity `rP_d`.
    r_d: Vector2<f64>,
    /// Owning body's angular velocity (0 for ground).
    p_d: f64,
}

fn point_kin(model: &Model, data: &Data, pi: usize) -> PointKin {
    let body = model.point_body[pi];
    PointKin {
        body,
        s: data.point_s[pi],
        s_r: data.point_s_r[pi],
        r: data.point_r[pi],
        r_d: data.point_r_d[pi],
        p_d: data.body_p_d(body),
    }
}

/// Evaluate all joint constraints at the current state.
#[must_use]
#[allow(clippy::too_many_lines)] // One arm per joint kind.
pub fn evaluate(model: &Model, data: &Data, t: f64) -> ConstraintSystem {
    let mut sys = ConstraintSystem {
        phi: DVector::zeros(model.n_const),
        jac: DMatrix::zeros(model.n_const, model.n_coords),
        gamma: DVector::zeros(model.n_const),
    };

    for ji in 0..model.njoint {
        let row = model.jnt_row_start[ji];
        match &model.joints[ji] {
            Joint::Revolute {
                i_point,
                j_point,
                fixed,
            } => {
                let pk_i = point_kin(model, data, *i_point);
                let pk_j = point_kin(model, data, *j_point);
                revolute_rows(model, &mut sys, row, &pk_i, &pk_j);
                if *fixed {
                    angle_row(
                        model,
                        &mut sys,
                        row + 2,
                        pk_i.body,
                        pk_j.body,
                        data.body_p(pk_i.body) - data.body_p(pk_j.body) - model.jnt_p0[ji],
                        0.0,
                    );
                }
            }

            Joint::Translational {
                i_point,
                j_point,
                i_uvec,
                fixed,
            } => {
                let pk_i = point_kin(model, data, *i_point);
                let pk_j = point_kin(model, data, *j_point);
                let u = data.uvec_u[*i_uvec];
                let u_r = data.uvec_u_r[*i_uvec];
                let d = pk_j.r - pk_i.r;
                let d_d = pk_j.r_d - pk_i.r_d;
                let pdi = pk_i.p_d;
                let pdj = pk_j.p_d;

                // Row 1: the j anchor stays on the axis line through the i
                // anchor, Φ = u_r·d.
                sys.phi[row] = u_r.dot(&d);
                if let Some(col) = model.coord_col(pk_i.body) {
                    sys.jac[(row, col)] = -u_r.x;
                    sys.jac[(row, col + 1)] = -u_r.y;
                    sys.jac[(row, col + 2)] = -u.dot(&d) - u_r.dot(&pk_i.s_r);
                }
                if let Some(col) = model.coord_col(pk_j.body) {
                    sys.jac[(row, col)] = u_r.x;
                    sys.jac[(row, col + 1)] = u_r.y;
                    sys.jac[(row, col + 2)] = u_r.dot(&pk_j.s_r);
                }
                sys.gamma[row] = u_r.dot(&d) * pdi * pdi + 2.0 * u.dot(&d_d) * pdi
                    - u_r.dot(&pk_i.s) * pdi * pdi
                    + u_r.dot(&pk_j.s) * pdj * pdj;

                // Row 2: relative rotation locked at its assembly value.
                angle_row(
                    model,
                    &mut sys,
                    row + 1,
                    pk_i.body,
                    pk_j.body,
                    data.body_p(pk_i.body) - data.body_p(pk_j.body) - model.jnt_p0[ji],
                    0.0,
                );

                // Row 3 (fix): travel along the axis frozen, Φ = u·d − d0.
                if *fixed {
                    sys.phi[row + 2] = u.dot(&d) - model.jnt_d0[ji];
                    if let Some(col) = model.coord_col(pk_i.body) {
                        sys.jac[(row + 2, col)] = -u.x;
                        sys.jac[(row + 2, col + 1)] = -u.y;
                        sys.jac[(row + 2, col + 2)] = u_r.dot(&d) - u.dot(&pk_i.s_r);
                    }
                    if let Some(col) = model.coord_col(pk_j.body) {
                        sys.jac[(row + 2, col)] = u.x;
                        sys.jac[(row + 2, col + 1)] = u.y;
                        sys.jac[(row + 2, col + 2)] = u.dot(&pk_j.s_r);
                    }
                    sys.gamma[row + 2] = u.dot(&d) * pdi * pdi - 2.0 * u_r.dot(&d_d) * pdi
                        - u.dot(&pk_i.s) * pdi * pdi
                        + u.dot(&pk_j.s) * pdj * pdj;
                }
            }

            Joint::RevoluteRevolute {
                i_point,
                j_point,
                length,
            } => {
                let pk_i = point_kin(model, data, *i_point);
                let pk_j = point_kin(model, data, *j_point);
                distance_row(model, &mut sys, row, &pk_i, &pk_j, length * length, 0.0);
            }

            Joint::RevoluteTranslational {
                i_point,
                j_point,
                i_uvec,
                distance,
            } => {
                let pk_i = point_kin(model, data, *i_point);
                let pk_j = point_kin(model, data, *j_point);
                let u = data.uvec_u[*i_uvec];
                let u_r = data.uvec_u_r[*i_uvec];
                let d = pk_j.r - pk_i.r;
                let d_d = pk_j.r_d - pk_i.r_d;
                let pdi = pk_i.p_d;
                let pdj = pk_j.p_d;

                sys.phi[row] = u_r.dot(&d) - distance;
                if let Some(col) = model.coord_col(pk_i.body) {
                    sys.jac[(row, col)] = -u_r.x;
                    sys.jac[(row, col + 1)] = -u_r.y;
                    sys.jac[(row, col + 2)] = -u.dot(&d) - u_r.dot(&pk_i.s_r);
                }
                if let Some(col) = model.coord_col(pk_j.body) {
                    sys.jac[(row, col)] = u_r.x;
                    sys.jac[(row, col + 1)] = u_r.y;
                    sys.jac[(row, col + 2)] = u_r.dot(&pk_j.s_r);
                }
                sys.gamma[row] = u_r.dot(&d) * pdi * pdi + 2.0 * u.dot(&d_d) * pdi
                    - u_r.dot(&pk_i.s) * pdi * pdi
                    + u_r.dot(&pk_j.s) * pdj * pdj;
            }

            Joint::RelativeRotation {
                i_body,
                j_body,
                driver,
            } => {
                let (f, _f_d, f_dd) = driver_value(model, *driver, model.jnt_p0[ji], t);
                angle_row(
                    model,
                    &mut sys,
                    row,
                    *i_body,
                    *j_body,
                    data.body_p(*i_body) - data.body_p(*j_body) - f,
                    f_dd,
                );
            }

            Joint::RelativeTranslation {
                i_point,
                j_point,
                driver,
            } => {
                let pk_i = point_kin(model, data, *i_point);
                let pk_j = point_kin(model, data, *j_point);
                let (f, f_d, f_dd) = driver_value(model, *driver, model.jnt_d0[ji], t);
                // Φ = d·d − f(t)²; the driver contributes 2(f_d² + f·f_dd)
                // to the acceleration bias.
                distance_row(
                    model,
                    &mut sys,
                    row,
                    &pk_i,
                    &pk_j,
                    f * f,
                    2.0 * (f_d * f_d + f * f_dd),
                );
            }

            Joint::Disc { body, radius } => {
                let bi = *body;
                let col = 3 * bi;
                // Center height stays at the radius.
                sys.phi[row] = data.r[bi].y - radius;
                sys.jac[(row, col + 1)] = 1.0;
                // Rolling without slip ties x-travel to rotation.
                sys.phi[row + 1] =
                    (data.r[bi].x - model.jnt_d0[ji]) + radius * (data.p[bi] - model.jnt_p0[ji]);
                sys.jac[(row + 1, col)] = 1.0;
                sys.jac[(row + 1, col + 2)] = *radius;
                // Both rows are linear in q: γ = 0.
            }

            Joint::Rigid { i_body, j_body } => {
                let h = data.body_rot(*j_body) * model.jnt_d0_vec[ji];
                let pdj = data.body_p_d(*j_body);
                let phi_pos = data.body_r(*i_body) - data.body_r(*j_body) - h;
                sys.phi[row] = phi_pos.x;
                sys.phi[row + 1] = phi_pos.y;
                if let Some(col) = model.coord_col(*i_body) {
                    sys.jac[(row, col)] = 1.0;
                    sys.jac[(row + 1, col + 1)] = 1.0;
                }
                if let Some(col) = model.coord_col(*j_body) {
                    let h_r = rot90(h);
                    sys.jac[(row, col)] = -1.0;
                    sys.jac[(row + 1, col + 1)] = -1.0;
                    sys.jac[(row, col + 2)] = -h_r.x;
                    sys.jac[(row + 1, col + 2)] = -h_r.y;
                }
                let g = -h * pdj * pdj;
                sys.gamma[row] = g.x;
                sys.gamma[row + 1] = g.y;

                angle_row(
                    model,
                    &mut sys,
                    row + 2,
                    *i_body,
                    *j_body,
                    data.body_p(*i_body) - data.body_p(*j_body) - model.jnt_p0[ji],
                    0.0,
                );
            }
        }
    }

    sys
}

/// Two rows enforcing coincidence of two anchor points, `Φ = rP_i − rP_j`.
fn revolute_rows(model: &Model, sys: &mut ConstraintSystem, row: usize, pk_i: &PointKin, pk_j: &PointKin) {
    let phi = pk_i.r - pk_j.r;
    sys.phi[row] = phi.x;
    sys.phi[row + 1] = phi.y;
    if let Some(col) = model.coord_col(pk_i.body) {
        sys.jac[(row, col)] = 1.0;
        sys.jac[(row + 1, col + 1)] = 1.0;
        sys.jac[(row, col + 2)] = pk_i.s_r.x;
        sys.jac[(row + 1, col + 2)] = pk_i.s_r.y;
    }
    if let Some(col) = model.coord_col(pk_j.body) {
        sys.jac[(row, col)] = -1.0;
        sys.jac[(row + 1, col + 1)] = -1.0;
        sys.jac[(row, col + 2)] = -pk_j.s_r.x;
        sys.jac[(row + 1, col + 2)] = -pk_j.s_r.y;
    }
    let g = pk_i.s * pk_i.p_d * pk_i.p_d - pk_j.s * pk_j.p_d * pk_j.p_d;
    sys.gamma[row] = g.x;
    sys.gamma[row + 1] = g.y;
}

/// One row locking or driving the relative angle, `Φ_q` entries ±1 on the
/// angle columns. `residual` is the already-formed `p_i − p_j − ref` and
/// `gamma` the driver's `f''` (zero for a frozen angle).
fn angle_row(
    model: &Model,
    sys: &mut ConstraintSystem,
    row: usize,
    i_body: BodyRef,
    j_body: BodyRef,
    residual: f64,
    gamma: f64,
) {
    sys.phi[row] = residual;
    if let Some(col) = model.coord_col(i_body) {
        sys.jac[(row, col + 2)] = 1.0;
    }
    if let Some(col) = model.coord_col(j_body) {
        sys.jac[(row, col + 2)] = -1.0;
    }
    sys.gamma[row] = gamma;
}

/// One row constraining the squared distance between two anchor points,
/// `Φ = d·d − target_sq`. `gamma_extra` carries any driver contribution.
fn distance_row(
    model: &Model,
    sys: &mut ConstraintSystem,
    row: usize,
    pk_i: &PointKin,
    pk_j: &PointKin,
    target_sq: f64,
    gamma_extra: f64,
) {
    let d = pk_j.r - pk_i.r;
    let d_d = pk_j.r_d - pk_i.r_d;
    sys.phi[row] = d.dot(&d) - target_sq;
    if let Some(col) = model.coord_col(pk_i.body) {
        sys.jac[(row, col)] = -2.0 * d.x;
        sys.jac[(row, col + 1)] = -2.0 * d.y;
        sys.jac[(row, col + 2)] = -2.0 * d.dot(&pk_i.s_r);
    }
    if let Some(col) = model.coord_col(pk_j.body) {
        sys.jac[(row, col)] = 2.0 * d.x;
        sys.jac[(row, col + 1)] = 2.0 * d.y;
        sys.jac[(row, col + 2)] = 2.0 * d.dot(&pk_j.s_r);
    }
    sys.gamma[row] = -2.0 * d_d.dot(&d_d) - 2.0 * d.dot(&pk_i.s) * pk_i.p_d * pk_i.p_d
        + 2.0 * d.dot(&pk_j.s) * pk_j.p_d * pk_j.p_d
        + gamma_extra;
}

/// Driver value/derivatives, falling back to the frozen assembly-time
/// reference when no driver is attached.
fn driver_value(model: &Model, driver: Option<usize>, frozen: f64, t: f64) -> (f64, f64, f64) {
    driver.map_or((frozen, 0.0, 0.0), |di| model.drivers[di].eval(t))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assemble::ModelDescription;
    use approx::assert_relative_eq;
    use dap_types::{BodyInit, DriverFunction, PointInit, SolverConfig, UnitVectorInit};

    /// Finite-difference check of the analytic Jacobian: perturb each
    /// generalized coordinate and compare ∂Φ/∂q against (Φ(q+h) − Φ(q−h))/2h.
    fn check_jacobian_fd(model: &Model, data: &Data, t: f64, tol: f64) {
        let sys = evaluate(model, data, t);
        let h = 1e-6;
        for col in 0..model.n_coords {
            let bi = col / 3;
            let k = col % 3;
            let mut plus = data.clone();
            let mut minus = data.clone();
            match k {
                0 => {
                    plus.r[bi].x += h;
                    minus.r[bi].x -= h;
                }
                1 => {
                    plus.r[bi].y += h;
                    minus.r[bi].y -= h;
                }
                _ => {
                    plus.p[bi] += h;
                    minus.p[bi] -= h;
                }
            }
            plus.forward(model);
            minus.forward(model);
            let phi_plus = evaluate(model, &plus, t).phi;
            let phi_minus = evaluate(model, &minus, t).phi;
            for row in 0..model.n_const {
                let fd = (phi_plus[row] - phi_minus[row]) / (2.0 * h);
                assert_relative_eq!(sys.jac[(row, col)], fd, epsilon = tol, max_relative = tol);
            }
        }
    }

    /// A two-body rig exercising several joint kinds at a generic (non-
    /// special) configuration with nonzero velocities.
    fn generic_two_body_description() -> ModelDescription {
        let mut desc = ModelDescription::new(SolverConfig::new(1.0, 0.01));
        let b0 = desc.add_body(
            BodyInit::at_rest(2.0, 0.7, Vector2::new(0.3, -0.2), 0.4)
                .with_velocity(Vector2::new(0.5, -0.1), 0.8),
        );
        let b1 = desc.add_body(
            BodyInit::at_rest(1.5, 0.3, Vector2::new(1.4, 0.9), -0.7)
                .with_velocity(Vector2::new(-0.2, 0.3), -1.1),
        );
        desc.add_point(PointInit::new(BodyRef::Body(b0), Vector2::new(0.25, 0.1)));
        desc.add_point(PointInit::new(BodyRef::Body(b1), Vector2::new(-0.3, 0.2)));
        desc.add_point(PointInit::ground(Vector2::new(0.1, 0.6)));
        desc.add_unit_vector(UnitVectorInit::new(BodyRef::Body(b0), Vector2::new(1.0, 0.4)));
        desc
    }

    #[test]
    fn revolute_jacobian_matches_finite_differences() {
        let mut desc = generic_two_body_description();
        desc.add_joint(Joint::Revolute {
            i_point: 0,
            j_point: 1,
            fixed: true,
        });
        let model = desc.assemble().expect("assembly failed");
        let data = model.make_data();
        check_jacobian_fd(&model, &data, 0.0, 1e-6);
    }

    #[test]
    fn translational_jacobian_matches_finite_differences() {
        let mut desc = generic_two_body_description();
        desc.add_joint(Joint::Translational {
            i_point: 0,
            j_point: 1,
            i_uvec: 0,
            fixed: true,
        });
        let model = desc.assemble().expect("assembly failed");
        let data = model.make_data();
        check_jacobian_fd(&model, &data, 0.0, 1e-6);
    }

    #[test]
    fn distance_joints_jacobian_matches_finite_differences() {
        let mut desc = generic_two_body_description();
        desc.add_joint(Joint::RevoluteRevolute {
            i_point: 0,
            j_point: 1,
            length: 0.9,
        });
        desc.add_joint(Joint::RevoluteTranslational {
            i_point: 0,
            j_point: 1,
            i_uvec: 0,
            distance: 0.2,
        });
        desc.add_joint(Joint::RelativeTranslation {
            i_point: 0,
            j_point: 2,
            driver: None,
        });
        let model = desc.assemble().expect("assembly failed");
        let data = model.make_data();
        check_jacobian_fd(&model, &data, 0.0, 1e-5);
    }

    #[test]
    fn rigid_and_relative_rotation_jacobians_match_finite_differences() {
        let mut desc = generic_two_body_description();
        desc.add_joint(Joint::Rigid {
            i_body: BodyRef::Body(0),
            j_body: BodyRef::Body(1),
        });
        desc.add_joint(Joint::RelativeRotation {
            i_body: BodyRef::Body(0),
            j_body: BodyRef::Ground,
            driver: None,
        });
        let model = desc.assemble().expect("assembly failed");
        let data = model.make_data();
        check_jacobian_fd(&model, &data, 0.0, 1e-6);
    }

    #[test]
    fn residuals_vanish_in_consistent_initial_configuration() {
        // Pendulum pinned at the ground origin: body point (-0.5, 0) sits
        // exactly on the ground point (0, 0).
        let mut desc = ModelDescription::new(SolverConfig::new(1.0, 0.01));
        let b = desc.add_body(BodyInit::at_rest(1.0, 0.1, Vector2::new(0.5, 0.0), 0.0));
        let pb = desc.add_point(PointInit::new(BodyRef::Body(b), Vector2::new(-0.5, 0.0)));
        let pg = desc.add_point(PointInit::ground(Vector2::zeros()));
        desc.add_joint(Joint::Revolute {
            i_point: pb,
            j_point: pg,
            fixed: false,
        });
        let model = desc.assemble().expect("assembly failed");
        let data = model.make_data();
        let sys = evaluate(&model, &data, 0.0);
        assert_relative_eq!(sys.phi[0], 0.0, epsilon = 1e-14);
        assert_relative_eq!(sys.phi[1], 0.0, epsilon = 1e-14);
    }

    #[test]
    fn driven_relative_rotation_uses_driver_value() {
        let mut desc = ModelDescription::new(SolverConfig::new(1.0, 0.01));
        let b = desc.add_body(BodyInit::at_rest(1.0, 0.1, Vector2::zeros(), 0.25));
        let di = desc.add_driver(DriverFunction::TypeB {
            t_start: 0.0,
            t_end: 1.0,
            v_start: 0.0,
            v_end: 1.0,
        });
        desc.add_joint(Joint::RelativeRotation {
            i_body: BodyRef::Body(b),
            j_body: BodyRef::Ground,
            driver: Some(di),
        });
        let model = desc.assemble().expect("assembly failed");
        let data = model.make_data();
        // At t = 0.25 the driver value is 0.25, matching the body angle.
        let sys = evaluate(&model, &data, 0.25);
        assert_relative_eq!(sys.phi[0], 0.0, epsilon = 1e-14);
        // At t = 0 the residual is the full angle.
        let sys = evaluate(&model, &data, 0.0);
        assert_relative_eq!(sys.phi[0], 0.25, epsilon = 1e-14);
    }

    #[test]
    fn disc_rows_are_linear_with_zero_bias() {
        let mut desc = ModelDescription::new(SolverConfig::new(1.0, 0.01));
        let b = desc.add_body(
            BodyInit::at_rest(1.0, 0.1, Vector2::new(0.0, 0.3), 0.0)
                .with_velocity(Vector2::new(1.0, 0.0), -1.0 / 0.3),
        );
        desc.add_joint(Joint::Disc { body: b, radius: 0.3 });
        let model = desc.assemble().expect("assembly failed");
        let data = model.make_data();
        let sys = evaluate(&model, &data, 0.0);
        assert_relative_eq!(sys.phi[0], 0.0, epsilon = 1e-14);
        assert_relative_eq!(sys.phi[1], 0.0, epsilon = 1e-14);
        assert_eq!(sys.gamma[0], 0.0);
        assert_eq!(sys.gamma[1], 0.0);
        check_jacobian_fd(&model, &data, 0.0, 1e-6);
    }
}
