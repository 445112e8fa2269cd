//! Generalized force assembly and potential-energy bookkeeping.
//!
//! Forces accumulate into the generalized force vector laid out like the
//! coordinate vector: `[F_x, F_y, τ]` per body, body `i` at offset `3·i`.
//! Ground absorbs reactions without any entry.

use dap_types::{BodyRef, Force, StepError};
use nalgebra::{DVector, Vector2};

use crate::data::Data;
use crate::model::Model;

// Below this separation a spring direction is undefined.
const MIN_SPRING_LENGTH: f64 = 1e-12;

/// Assemble the generalized applied-force vector at the current state.
///
/// # Errors
///
/// [`StepError::SpringAnchorsCollapsed`] when a point-to-point element's
/// anchors coincide, leaving the force direction undefined.
pub fn generalized_forces(model: &Model, data: &Data, t: f64) -> Result<DVector<f64>, StepError> {
    let mut f = DVector::zeros(model.n_coords);

    for (fi, force) in model.forces.iter().enumerate() {
        match force {
            Force::Gravity { g, weight_scale } => {
                for bi in 0..model.nbody {
                    let w = model.body_mass[bi] * weight_scale;
                    f[3 * bi] += w * g.x;
                    f[3 * bi + 1] += w * g.y;
                }
            }

            Force::PointToPoint {
                i_point,
                j_point,
                stiffness,
                damping,
                undeformed_length,
                length_driver,
            } => {
                let d = data.point_r[*j_point] - data.point_r[*i_point];
                let len = d.norm();
                if len < MIN_SPRING_LENGTH {
                    return Err(StepError::SpringAnchorsCollapsed {
                        force: fi,
                        time: t,
                    });
                }
                let u = d / len;
                let d_d = data.point_r_d[*j_point] - data.point_r_d[*i_point];
                let len_d = u.dot(&d_d);
                let l0 = length_driver.map_or(*undeformed_length, |di| model.drivers[di].eval(t).0);
                // Positive fs pulls the anchors together.
                let fs = stiffness * (len - l0) + damping * len_d;

                apply_point_force(model, data, &mut f, *i_point, fs * u);
                apply_point_force(model, data, &mut f, *j_point, -fs * u);
            }

            Force::Rotational {
                i_body,
                j_body,
                stiffness,
                damping,
                undeformed_angle,
                angle_driver,
            } => {
                let theta = data.body_p(*i_body) - data.body_p(*j_body);
                let theta_d = data.body_p_d(*i_body) - data.body_p_d(*j_body);
                let theta0 =
                    angle_driver.map_or(*undeformed_angle, |di| model.drivers[di].eval(t).0);
                let tau = stiffness * (theta - theta0) + damping * theta_d;
                if let Some(bi) = i_body.index() {
                    f[3 * bi + 2] -= tau;
                }
                if let Some(bj) = j_body.index() {
                    f[3 * bj + 2] += tau;
                }
            }
        }
    }

    Ok(f)
}

/// Accumulate a world-frame force acting at an anchor point into its owning
/// body's force and torque slots. Ground anchors take no entry.
fn apply_point_force(
    model: &Model,
    data: &Data,
    f: &mut DVector<f64>,
    point: usize,
    force: Vector2<f64>,
) {
    if let BodyRef::Body(bi) = model.point_body[point] {
        f[3 * bi] += force.x;
        f[3 * bi + 1] += force.y;
        // Torque about the mass center: sP_r·F is the planar s × F.
        f[3 * bi + 2] += data.point_s_r[point].dot(&force);
    }
}

/// Potential energy stored in gravity and in every spring element.
#[must_use]
pub fn potential_energy(model: &Model, data: &Data, t: f64) -> f64 {
    let mut pe = 0.0;
    for force in &model.forces {
        match force {
            Force::Gravity { g, weight_scale } => {
                for bi in 0..model.nbody {
                    pe -= model.body_mass[bi] * weight_scale * g.dot(&data.r[bi]);
                }
            }
            Force::PointToPoint {
                i_point,
                j_point,
                stiffness,
                undeformed_length,
                length_driver,
                ..
            } => {
                let len = (data.point_r[*j_point] - data.point_r[*i_point]).norm();
                let l0 = length_driver.map_or(*undeformed_length, |di| model.drivers[di].eval(t).0);
                let stretch = len - l0;
                pe += 0.5 * stiffness * stretch * stretch;
            }
            Force::Rotational {
                i_body,
                j_body,
                stiffness,
                undeformed_angle,
                angle_driver,
                ..
            } => {
                let theta = data.body_p(*i_body) - data.body_p(*j_body);
                let theta0 =
                    angle_driver.map_or(*undeformed_angle, |di| model.drivers[di].eval(t).0);
                let twist = theta - theta0;
                pe += 0.5 * stiffness * twist * twist;
            }
        }
    }
    pe
}
