//! Static model definition.
//!
//! [`Model`] is the immutable, fully cross-linked description of a planar
//! multibody system, produced once by [`crate::ModelDescription::assemble`]
//! and shared read-only across every pipeline stage. All derived bookkeeping
//! (coordinate offsets, inverse mass properties, constraint row ranges,
//! frozen reference offsets for fixed joints) lives here; the mutable
//! per-step state lives in [`crate::Data`].

use dap_types::{BodyRef, DriverFunction, Force, Joint, SolverConfig};
use nalgebra::Vector2;

use crate::data::Data;
use crate::kinematics::rot;

/// Static model definition.
///
/// Immutable after assembly. Entity arrays are indexed by their respective
/// ids; ground is not stored as a body and contributes no coordinates.
///
/// # Coordinate Layout
///
/// The generalized coordinate vector stacks `[r_x, r_y, p]` per body,
/// positions first and velocities second: body `i` owns position slots
/// `irc = 3·i .. 3·i+3` and velocity slots `irv = 3·nbody + 3·i ..`.
#[derive(Debug, Clone)]
pub struct Model {
    // ==================== Dimensions ====================
    /// Number of moving bodies (ground excluded).
    pub nbody: usize,
    /// Number of anchor points.
    pub npoint: usize,
    /// Number of unit vectors.
    pub nuvec: usize,
    /// Number of joints.
    pub njoint: usize,
    /// Number of force elements.
    pub nforce: usize,
    /// Number of generalized coordinates, `3·nbody`.
    pub n_coords: usize,
    /// Total number of constraint equations.
    pub n_const: usize,

    // ==================== Bodies (indexed by body id) ====================
    /// Mass in kg.
    pub body_mass: Vec<f64>,
    /// Polar moment of inertia in kg·m².
    pub body_inertia: Vec<f64>,
    /// Precomputed `1/m`.
    pub body_inv_mass: Vec<f64>,
    /// Precomputed `1/J`.
    pub body_inv_inertia: Vec<f64>,
    /// Initial mass-center position.
    pub body_r0: Vec<Vector2<f64>>,
    /// Initial orientation angle.
    pub body_p0: Vec<f64>,
    /// Initial linear velocity.
    pub body_rd0: Vec<Vector2<f64>>,
    /// Initial angular velocity.
    pub body_pd0: Vec<f64>,
    /// Offset of the body's position block in the coordinate vector.
    pub body_irc: Vec<usize>,
    /// Offset of the body's velocity block in the stacked state vector.
    pub body_irv: Vec<usize>,
    /// Ids of the points attached to this body.
    pub body_points: Vec<Vec<usize>>,
    /// Optional display names.
    pub body_name: Vec<Option<String>>,

    // ==================== Points and unit vectors ====================
    /// Owning body of each point.
    pub point_body: Vec<BodyRef>,
    /// Body-frame offset of each point.
    pub point_s_local: Vec<Vector2<f64>>,
    /// Owning body of each unit vector.
    pub uvec_body: Vec<BodyRef>,
    /// Body-frame direction of each unit vector (normalized at assembly).
    pub uvec_local: Vec<Vector2<f64>>,

    // ==================== Joints (indexed by joint id) ====================
    /// The joint records themselves.
    pub joints: Vec<Joint>,
    /// Number of constraint rows each joint contributes.
    pub jnt_mrows: Vec<usize>,
    /// Number of bodies each joint involves.
    pub jnt_nbody: Vec<usize>,
    /// First constraint row of each joint (assigned in registration order).
    pub jnt_row_start: Vec<usize>,
    /// One past the last constraint row of each joint.
    pub jnt_row_end: Vec<usize>,
    /// First connected body, resolved from anchors where applicable.
    pub jnt_i_body: Vec<BodyRef>,
    /// Second connected body.
    pub jnt_j_body: Vec<BodyRef>,
    /// Frozen reference angle (`p0`): relative angle for fixed/rigid/
    /// relative-rotation joints, initial orientation for disc joints.
    pub jnt_p0: Vec<f64>,
    /// Frozen scalar reference (`d0`): axis travel for fixed translational
    /// joints, anchor distance for relative-translation joints, initial
    /// x-position for disc joints.
    pub jnt_d0: Vec<f64>,
    /// Frozen relative position of body i in body j's frame (rigid joints).
    pub jnt_d0_vec: Vec<Vector2<f64>>,

    // ==================== Forces and drivers ====================
    /// Force element records.
    pub forces: Vec<Force>,
    /// Driver function records.
    pub drivers: Vec<DriverFunction>,

    // ==================== Configuration ====================
    /// Time span, step size, and integration method.
    pub config: SolverConfig,
}

impl Model {
    /// Column of a body's position block in the constraint Jacobian, or
    /// `None` for ground (ground contributes no columns).
    #[must_use]
    pub fn coord_col(&self, body: BodyRef) -> Option<usize> {
        body.index().map(|i| 3 * i)
    }

    /// Create the mutable simulation state initialized from the bodies'
    /// initial conditions, with all derived world-frame fields filled in.
    #[must_use]
    pub fn make_data(&self) -> Data {
        let mut data = Data {
            time: self.config.t_initial,
            step_count: 0,
            r: self.body_r0.clone(),
            p: self.body_p0.clone(),
            r_d: self.body_rd0.clone(),
            p_d: self.body_pd0.clone(),
            r_dd: vec![Vector2::zeros(); self.nbody],
            p_dd: vec![0.0; self.nbody],
            rot_mat: self.body_p0.iter().map(|&p| rot(p)).collect(),
            point_s: vec![Vector2::zeros(); self.npoint],
            point_s_r: vec![Vector2::zeros(); self.npoint],
            point_r: vec![Vector2::zeros(); self.npoint],
            point_r_d: vec![Vector2::zeros(); self.npoint],
            uvec_u: vec![Vector2::zeros(); self.nuvec],
            uvec_u_r: vec![Vector2::zeros(); self.nuvec],
            uvec_u_d: vec![Vector2::zeros(); self.nuvec],
            lambda: nalgebra::DVector::zeros(self.n_const),
            energy_kinetic: 0.0,
            energy_potential: 0.0,
        };
        data.forward(self);
        data
    }
}
