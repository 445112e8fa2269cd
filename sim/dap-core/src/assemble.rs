//! Model assembly: cross-reference resolution and derived-field
//! precomputation.
//!
//! [`ModelDescription`] batch-holds the raw entity records;
//! [`ModelDescription::assemble`] validates every cross reference and
//! produces a fully linked [`Model`], or a typed [`ModelError`] with no
//! partial model. Assembly is deterministic and idempotent: re-assembling
//! the same description yields identical derived fields.

use dap_types::{
    BodyInit, BodyRef, DriverFunction, Force, Joint, ModelError, PointInit, SolverConfig,
    UnitVectorInit,
};
use nalgebra::Vector2;
use tracing::debug;

use crate::kinematics::rot;
use crate::model::Model;

/// Raw, un-cross-linked description of a planar multibody system.
///
/// Entities are batch-loaded and reference each other by index; nothing is
/// validated until [`assemble`](Self::assemble) runs.
#[derive(Debug, Clone, Default)]
pub struct ModelDescription {
    /// Rigid body records.
    pub bodies: Vec<BodyInit>,
    /// Anchor point records.
    pub points: Vec<PointInit>,
    /// Unit vector records.
    pub unit_vectors: Vec<UnitVectorInit>,
    /// Force element records.
    pub forces: Vec<Force>,
    /// Joint records.
    pub joints: Vec<Joint>,
    /// Driver function records.
    pub drivers: Vec<DriverFunction>,
    /// Time span and stepping configuration.
    pub config: SolverConfig,
}

impl ModelDescription {
    /// Empty description with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Register a body, returning its id.
    pub fn add_body(&mut self, body: BodyInit) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Register a point, returning its id.
    pub fn add_point(&mut self, point: PointInit) -> usize {
        self.points.push(point);
        self.points.len() - 1
    }

    /// Register a unit vector, returning its id.
    pub fn add_unit_vector(&mut self, uvec: UnitVectorInit) -> usize {
        self.unit_vectors.push(uvec);
        self.unit_vectors.len() - 1
    }

    /// Register a force element, returning its id.
    pub fn add_force(&mut self, force: Force) -> usize {
        self.forces.push(force);
        self.forces.len() - 1
    }

    /// Register a joint, returning its id. Constraint rows are assigned in
    /// registration order.
    pub fn add_joint(&mut self, joint: Joint) -> usize {
        self.joints.push(joint);
        self.joints.len() - 1
    }

    /// Register a driver function, returning its id.
    pub fn add_driver(&mut self, driver: DriverFunction) -> usize {
        self.drivers.push(driver);
        self.drivers.len() - 1
    }

    /// Resolve all cross references and precompute derived quantities.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] describing the first configuration problem
    /// found; no partial model is produced.
    #[allow(clippy::too_many_lines)] // The per-joint-kind table is one long match.
    pub fn assemble(&self) -> Result<Model, ModelError> {
        self.validate_config()?;
        self.validate_bodies()?;

        let nbody = self.bodies.len();

        // Points and unit vectors resolve their owning bodies.
        for (pi, point) in self.points.iter().enumerate() {
            self.check_body_ref("point", pi, point.body)?;
        }
        let mut uvec_local = Vec::with_capacity(self.unit_vectors.len());
        for (vi, uvec) in self.unit_vectors.iter().enumerate() {
            self.check_body_ref("unit vector", vi, uvec.body)?;
            let norm = uvec.u_local.norm();
            if norm < 1e-12 {
                return Err(ModelError::ZeroLengthUnitVector { uvec: vi });
            }
            uvec_local.push(uvec.u_local / norm);
        }

        self.validate_forces()?;

        // Initial kinematics, used for frozen joint references and for the
        // coincident-spring-anchor check. Ground has identity kinematics.
        let body_p = |b: BodyRef| b.index().map_or(0.0, |i| self.bodies[i].p);
        let body_r = |b: BodyRef| b.index().map_or(Vector2::zeros(), |i| self.bodies[i].r);
        let point_world = |pi: usize| {
            let point = &self.points[pi];
            match point.body {
                BodyRef::Ground => point.s_local,
                BodyRef::Body(bi) => self.bodies[bi].r + rot(self.bodies[bi].p) * point.s_local,
            }
        };
        let uvec_world = |vi: usize| {
            let body = self.unit_vectors[vi].body;
            rot(body_p(body)) * uvec_local[vi]
        };

        for (fi, force) in self.forces.iter().enumerate() {
            if let Force::PointToPoint {
                i_point, j_point, ..
            } = force
            {
                let d = point_world(*j_point) - point_world(*i_point);
                if d.norm() < 1e-12 {
                    return Err(ModelError::CoincidentSpringAnchors { force: fi });
                }
            }
        }

        // Joints: resolve bodies, freeze reference offsets, assign rows.
        let njoint = self.joints.len();
        let mut jnt_i_body = Vec::with_capacity(njoint);
        let mut jnt_j_body = Vec::with_capacity(njoint);
        let mut jnt_p0 = vec![0.0; njoint];
        let mut jnt_d0 = vec![0.0; njoint];
        let mut jnt_d0_vec = vec![Vector2::zeros(); njoint];
        let mut jnt_mrows = Vec::with_capacity(njoint);
        let mut jnt_nbody = Vec::with_capacity(njoint);
        let mut jnt_row_start = Vec::with_capacity(njoint);
        let mut jnt_row_end = Vec::with_capacity(njoint);
        let mut n_const = 0;

        for (ji, joint) in self.joints.iter().enumerate() {
            let (i_body, j_body) = self.resolve_joint_bodies(ji, joint)?;

            // Ground-to-ground leaves nothing to constrain; a self-joint
            // constrains a body against itself. Both are modeling errors.
            if i_body.is_ground() && j_body.is_ground() {
                return Err(ModelError::GroundToGroundJoint {
                    joint: ji,
                    kind: joint.kind(),
                });
            }
            if let (Some(bi), Some(bj)) = (i_body.index(), j_body.index()) {
                if bi == bj {
                    return Err(ModelError::SelfJoint {
                        joint: ji,
                        kind: joint.kind(),
                        body: bi,
                    });
                }
            }

            match joint {
                Joint::Revolute { fixed, .. } => {
                    if *fixed {
                        jnt_p0[ji] = body_p(i_body) - body_p(j_body);
                    }
                }
                Joint::Translational {
                    i_point,
                    j_point,
                    i_uvec,
                    fixed,
                } => {
                    jnt_p0[ji] = body_p(i_body) - body_p(j_body);
                    if *fixed {
                        let d = point_world(*j_point) - point_world(*i_point);
                        jnt_d0[ji] = uvec_world(*i_uvec).dot(&d);
                    }
                }
                Joint::RevoluteRevolute { length, .. } => {
                    if *length <= 0.0 {
                        return Err(ModelError::NonPositiveJointParameter {
                            joint: ji,
                            kind: joint.kind(),
                            parameter: "length",
                        });
                    }
                }
                Joint::RevoluteTranslational { .. } => {}
                Joint::RelativeRotation { driver, .. } => {
                    if driver.is_none() {
                        jnt_p0[ji] = body_p(i_body) - body_p(j_body);
                    }
                }
                Joint::RelativeTranslation {
                    i_point,
                    j_point,
                    driver,
                } => {
                    if driver.is_none() {
                        let d0 = (point_world(*j_point) - point_world(*i_point)).norm();
                        if d0 < 1e-12 {
                            return Err(ModelError::NonPositiveJointParameter {
                                joint: ji,
                                kind: joint.kind(),
                                parameter: "anchor distance",
                            });
                        }
                        jnt_d0[ji] = d0;
                    }
                }
                Joint::Disc { body, radius } => {
                    if *radius <= 0.0 {
                        return Err(ModelError::NonPositiveJointParameter {
                            joint: ji,
                            kind: joint.kind(),
                            parameter: "radius",
                        });
                    }
                    jnt_d0[ji] = self.bodies[*body].r.x;
                    jnt_p0[ji] = self.bodies[*body].p;
                }
                Joint::Rigid { .. } => {
                    let a_j_t = rot(body_p(j_body)).transpose();
                    jnt_d0_vec[ji] = a_j_t * (body_r(i_body) - body_r(j_body));
                    jnt_p0[ji] = body_p(i_body) - body_p(j_body);
                }
            }

            jnt_i_body.push(i_body);
            jnt_j_body.push(j_body);
            jnt_mrows.push(joint.mrows());
            jnt_nbody.push(joint.nbody());
            jnt_row_start.push(n_const);
            n_const += joint.mrows();
            jnt_row_end.push(n_const);
        }

        // Per-body bookkeeping: coordinate offsets and attached points.
        let mut body_points = vec![Vec::new(); nbody];
        for (pi, point) in self.points.iter().enumerate() {
            if let Some(bi) = point.body.index() {
                body_points[bi].push(pi);
            }
        }

        let model = Model {
            nbody,
            npoint: self.points.len(),
            nuvec: self.unit_vectors.len(),
            njoint,
            nforce: self.forces.len(),
            n_coords: 3 * nbody,
            n_const,
            body_mass: self.bodies.iter().map(|b| b.mass).collect(),
            body_inertia: self.bodies.iter().map(|b| b.inertia).collect(),
            body_inv_mass: self.bodies.iter().map(|b| 1.0 / b.mass).collect(),
            body_inv_inertia: self.bodies.iter().map(|b| 1.0 / b.inertia).collect(),
            body_r0: self.bodies.iter().map(|b| b.r).collect(),
            body_p0: self.bodies.iter().map(|b| b.p).collect(),
            body_rd0: self.bodies.iter().map(|b| b.r_d).collect(),
            body_pd0: self.bodies.iter().map(|b| b.p_d).collect(),
            body_irc: (0..nbody).map(|i| 3 * i).collect(),
            body_irv: (0..nbody).map(|i| 3 * nbody + 3 * i).collect(),
            body_points,
            body_name: self.bodies.iter().map(|b| b.name.clone()).collect(),
            point_body: self.points.iter().map(|p| p.body).collect(),
            point_s_local: self.points.iter().map(|p| p.s_local).collect(),
            uvec_body: self.unit_vectors.iter().map(|v| v.body).collect(),
            uvec_local,
            joints: self.joints.clone(),
            jnt_mrows,
            jnt_nbody,
            jnt_row_start,
            jnt_row_end,
            jnt_i_body,
            jnt_j_body,
            jnt_p0,
            jnt_d0,
            jnt_d0_vec,
            forces: self.forces.clone(),
            drivers: self.drivers.clone(),
            config: self.config.clone(),
        };

        debug!(
            nbody = model.nbody,
            njoint = model.njoint,
            n_const = model.n_const,
            n_coords = model.n_coords,
            "model assembled"
        );
        Ok(model)
    }

    fn validate_config(&self) -> Result<(), ModelError> {
        let cfg = &self.config;
        let all_finite =
            cfg.t_initial.is_finite() && cfg.t_final.is_finite() && cfg.reporting_time_step.is_finite();
        if !all_finite {
            return Err(ModelError::InvalidConfig {
                reason: "time span contains non-finite values".into(),
            });
        }
        if cfg.reporting_time_step <= 0.0 {
            return Err(ModelError::InvalidConfig {
                reason: format!("reporting time step {} is not positive", cfg.reporting_time_step),
            });
        }
        if cfg.t_final <= cfg.t_initial {
            return Err(ModelError::InvalidConfig {
                reason: format!(
                    "end time {} does not exceed start time {}",
                    cfg.t_final, cfg.t_initial
                ),
            });
        }
        let normal_ok =
            cfg.plane_normal.iter().all(|c| c.is_finite()) && cfg.plane_normal.norm() > 1e-12;
        if !normal_ok {
            return Err(ModelError::InvalidConfig {
                reason: "plane normal is zero or non-finite".into(),
            });
        }
        Ok(())
    }

    fn validate_bodies(&self) -> Result<(), ModelError> {
        for (bi, body) in self.bodies.iter().enumerate() {
            if body.mass <= 0.0 {
                return Err(ModelError::NonPositiveMassProperty {
                    body: bi,
                    property: "mass",
                });
            }
            if body.inertia <= 0.0 {
                return Err(ModelError::NonPositiveMassProperty {
                    body: bi,
                    property: "inertia",
                });
            }
            let finite = body.r.x.is_finite()
                && body.r.y.is_finite()
                && body.p.is_finite()
                && body.r_d.x.is_finite()
                && body.r_d.y.is_finite()
                && body.p_d.is_finite();
            if !finite {
                return Err(ModelError::NonFiniteInitialState { body: bi });
            }
        }
        Ok(())
    }

    fn validate_forces(&self) -> Result<(), ModelError> {
        for (fi, force) in self.forces.iter().enumerate() {
            match force {
                Force::Gravity { .. } => {}
                Force::PointToPoint {
                    i_point,
                    j_point,
                    length_driver,
                    ..
                } => {
                    self.check_point_ref("force", fi, *i_point)?;
                    self.check_point_ref("force", fi, *j_point)?;
                    if let Some(di) = length_driver {
                        self.check_driver_ref("force", fi, *di)?;
                    }
                }
                Force::Rotational {
                    i_body,
                    j_body,
                    angle_driver,
                    ..
                } => {
                    self.check_body_ref("force", fi, *i_body)?;
                    self.check_body_ref("force", fi, *j_body)?;
                    if let Some(di) = angle_driver {
                        self.check_driver_ref("force", fi, *di)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve a joint's two body references, validating every index the
    /// joint carries along the way.
    fn resolve_joint_bodies(&self, ji: usize, joint: &Joint) -> Result<(BodyRef, BodyRef), ModelError> {
        let point_body = |pi: usize| self.points[pi].body;
        match joint {
            Joint::Revolute {
                i_point, j_point, ..
            }
            | Joint::RevoluteRevolute {
                i_point, j_point, ..
            } => {
                self.check_point_ref("joint", ji, *i_point)?;
                self.check_point_ref("joint", ji, *j_point)?;
                Ok((point_body(*i_point), point_body(*j_point)))
            }
            Joint::Translational {
                i_point,
                j_point,
                i_uvec,
                ..
            }
            | Joint::RevoluteTranslational {
                i_point,
                j_point,
                i_uvec,
                ..
            } => {
                self.check_point_ref("joint", ji, *i_point)?;
                self.check_point_ref("joint", ji, *j_point)?;
                if *i_uvec >= self.unit_vectors.len() {
                    return Err(ModelError::DanglingUnitVectorRef {
                        joint: ji,
                        uvec: *i_uvec,
                    });
                }
                // The axis rotates with the first anchor's body; an axis on
                // any other body would make the constraint derivatives wrong.
                if self.unit_vectors[*i_uvec].body != point_body(*i_point) {
                    return Err(ModelError::AxisOwnerMismatch {
                        joint: ji,
                        uvec: *i_uvec,
                    });
                }
                Ok((point_body(*i_point), point_body(*j_point)))
            }
            Joint::RelativeRotation {
                i_body,
                j_body,
                driver,
            } => {
                self.check_body_ref("joint", ji, *i_body)?;
                self.check_body_ref("joint", ji, *j_body)?;
                if let Some(di) = driver {
                    self.check_driver_ref("joint", ji, *di)?;
                }
                Ok((*i_body, *j_body))
            }
            Joint::RelativeTranslation {
                i_point,
                j_point,
                driver,
            } => {
                self.check_point_ref("joint", ji, *i_point)?;
                self.check_point_ref("joint", ji, *j_point)?;
                if let Some(di) = driver {
                    self.check_driver_ref("joint", ji, *di)?;
                }
                Ok((point_body(*i_point), point_body(*j_point)))
            }
            Joint::Disc { body, .. } => {
                self.check_body_ref("joint", ji, BodyRef::Body(*body))?;
                Ok((BodyRef::Body(*body), BodyRef::Ground))
            }
            Joint::Rigid { i_body, j_body } => {
                self.check_body_ref("joint", ji, *i_body)?;
                self.check_body_ref("joint", ji, *j_body)?;
                Ok((*i_body, *j_body))
            }
        }
    }

    fn check_point_ref(&self, entity: &'static str, index: usize, point: usize) -> Result<(), ModelError> {
        if point >= self.points.len() {
            return Err(ModelError::DanglingPointRef {
                entity,
                index,
                point,
            });
        }
        Ok(())
    }

    fn check_body_ref(&self, entity: &'static str, index: usize, body: BodyRef) -> Result<(), ModelError> {
        if let BodyRef::Body(bi) = body {
            if bi >= self.bodies.len() {
                return Err(ModelError::DanglingBodyRef {
                    entity,
                    index,
                    body: bi,
                });
            }
        }
        Ok(())
    }

    fn check_driver_ref(&self, entity: &'static str, index: usize, driver: usize) -> Result<(), ModelError> {
        if driver >= self.drivers.len() {
            return Err(ModelError::DanglingDriverRef {
                entity,
                index,
                driver,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn slider_description(axis_body: BodyRef) -> ModelDescription {
        let mut desc = ModelDescription::new(SolverConfig::new(1.0, 0.01));
        let b = desc.add_body(BodyInit::at_rest(1.0, 0.1, Vector2::zeros(), 0.0));
        let pi = desc.add_point(PointInit::new(BodyRef::Body(b), Vector2::zeros()));
        let pj = desc.add_point(PointInit::ground(Vector2::new(1.0, 0.0)));
        let axis = desc.add_unit_vector(UnitVectorInit::new(axis_body, Vector2::new(1.0, 0.0)));
        desc.add_joint(Joint::Translational {
            i_point: pi,
            j_point: pj,
            i_uvec: axis,
            fixed: false,
        });
        desc
    }

    #[test]
    fn sliding_axis_must_live_on_the_first_anchor_body() {
        // Axis on ground while the first anchor sits on the body: the axis
        // would not rotate with the anchor, so assembly rejects it.
        let err = slider_description(BodyRef::Ground).assemble().unwrap_err();
        assert_eq!(
            err,
            ModelError::AxisOwnerMismatch { joint: 0, uvec: 0 }
        );

        // Axis on the first anchor's own body assembles fine.
        let model = slider_description(BodyRef::Body(0))
            .assemble()
            .expect("matching axis owner must assemble");
        assert_eq!(model.n_const, 2);
    }

    #[test]
    fn ground_anchored_axis_with_ground_anchor_assembles() {
        let mut desc = ModelDescription::new(SolverConfig::new(1.0, 0.01));
        let b = desc.add_body(BodyInit::at_rest(1.0, 0.1, Vector2::new(1.0, 0.0), 0.0));
        let pi = desc.add_point(PointInit::ground(Vector2::zeros()));
        let pj = desc.add_point(PointInit::new(BodyRef::Body(b), Vector2::zeros()));
        let axis = desc.add_unit_vector(UnitVectorInit::new(BodyRef::Ground, Vector2::new(1.0, 0.0)));
        desc.add_joint(Joint::RevoluteTranslational {
            i_point: pi,
            j_point: pj,
            i_uvec: axis,
            distance: 0.0,
        });
        assert!(desc.assemble().is_ok());
    }
}
