//! Error taxonomy for model assembly and simulation stepping.
//!
//! Configuration problems are detected at assembly time and abort before any
//! integration; runtime problems (singular system, non-finite state) abort
//! the run with the last valid step index. Nothing is silently recovered:
//! a multibody integration failure indicates a modeling error, not a
//! transient fault.

use thiserror::Error;

/// Configuration errors detected while assembling a model.
///
/// Assembly is all-or-nothing: any of these aborts with no partial model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// A joint or force references a point that does not exist.
    #[error("{entity} {index} references nonexistent point {point}")]
    DanglingPointRef {
        /// "joint" or "force".
        entity: &'static str,
        /// Index of the offending joint or force.
        index: usize,
        /// The out-of-range point index.
        point: usize,
    },

    /// A point, unit vector, joint, or force references a body that does
    /// not exist.
    #[error("{entity} {index} references nonexistent body {body}")]
    DanglingBodyRef {
        /// "point", "unit vector", "joint", or "force".
        entity: &'static str,
        /// Index of the offending entity.
        index: usize,
        /// The out-of-range body index.
        body: usize,
    },

    /// A joint references a unit vector that does not exist.
    #[error("joint {joint} references nonexistent unit vector {uvec}")]
    DanglingUnitVectorRef {
        /// Index of the offending joint.
        joint: usize,
        /// The out-of-range unit vector index.
        uvec: usize,
    },

    /// A joint or force references a driver function that does not exist.
    #[error("{entity} {index} references nonexistent driver function {driver}")]
    DanglingDriverRef {
        /// "joint" or "force".
        entity: &'static str,
        /// Index of the offending entity.
        index: usize,
        /// The out-of-range driver index.
        driver: usize,
    },

    /// A joint connects a body to itself.
    #[error("joint {joint} ({kind}) connects body {body} to itself")]
    SelfJoint {
        /// Index of the offending joint.
        joint: usize,
        /// Joint kind name.
        kind: &'static str,
        /// The body connected to itself.
        body: usize,
    },

    /// A joint connects ground to ground, leaving nothing to constrain.
    #[error("joint {joint} ({kind}) connects ground to ground")]
    GroundToGroundJoint {
        /// Index of the offending joint.
        joint: usize,
        /// Joint kind name.
        kind: &'static str,
    },

    /// A spring's two anchor points coincide in the initial configuration,
    /// so its force direction is undefined.
    #[error("force {force} spring anchors coincide in the initial configuration")]
    CoincidentSpringAnchors {
        /// Index of the offending force.
        force: usize,
    },

    /// A sliding-type joint's axis unit vector is not owned by the same
    /// body as the joint's first anchor point. The axis kinematics rotate
    /// with the first anchor's body, so an axis living anywhere else would
    /// silently produce wrong constraint derivatives.
    #[error("joint {joint} sliding axis (unit vector {uvec}) is not on the first anchor's body")]
    AxisOwnerMismatch {
        /// Index of the offending joint.
        joint: usize,
        /// Index of the offending unit vector.
        uvec: usize,
    },

    /// A unit vector has (near-)zero length and cannot be normalized.
    #[error("unit vector {uvec} has zero length")]
    ZeroLengthUnitVector {
        /// Index of the offending unit vector.
        uvec: usize,
    },

    /// A body's mass or inertia is not strictly positive.
    #[error("body {body} has non-positive {property}")]
    NonPositiveMassProperty {
        /// Index of the offending body.
        body: usize,
        /// "mass" or "inertia".
        property: &'static str,
    },

    /// A joint parameter (link length, disc radius) is not strictly
    /// positive.
    #[error("joint {joint} ({kind}) has non-positive {parameter}")]
    NonPositiveJointParameter {
        /// Index of the offending joint.
        joint: usize,
        /// Joint kind name.
        kind: &'static str,
        /// Name of the offending parameter.
        parameter: &'static str,
    },

    /// The solver configuration is invalid (non-positive step, empty or
    /// reversed time span, non-finite values, degenerate plane normal).
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// A body's initial state contains NaN or infinity.
    #[error("body {body} has a non-finite initial state")]
    NonFiniteInitialState {
        /// Index of the offending body.
        body: usize,
    },
}

/// Errors that can occur during a simulation step.
///
/// `step()` returns `Result<(), StepError>`; callers must handle failures
/// explicitly. Both variants report the index of the last successfully
/// completed step and the time at which the failure occurred.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    /// The augmented equation-of-motion matrix is numerically singular:
    /// redundant or conflicting constraints, or motion left undetermined.
    #[error("singular equation-of-motion system at t = {time} (last valid step {last_step})")]
    SingularSystem {
        /// Index of the last successfully completed step.
        last_step: usize,
        /// Simulation time at which the solve failed.
        time: f64,
    },

    /// NaN or infinity appeared in an integrated quantity.
    #[error("non-finite state at t = {time} (last valid step {last_step})")]
    NonFinite {
        /// Index of the last successfully completed step.
        last_step: usize,
        /// Simulation time at which the divergence was detected.
        time: f64,
    },

    /// A spring's anchor points collapsed onto each other mid-run, leaving
    /// its force direction undefined.
    #[error("force {force} spring anchors coincide at t = {time}")]
    SpringAnchorsCollapsed {
        /// Index of the offending force.
        force: usize,
        /// Simulation time at which the collapse was detected.
        time: f64,
    },
}

impl StepError {
    /// Index of the last successfully completed step, when known.
    #[must_use]
    pub fn last_valid_step(&self) -> Option<usize> {
        match self {
            Self::SingularSystem { last_step, .. } | Self::NonFinite { last_step, .. } => {
                Some(*last_step)
            }
            Self::SpringAnchorsCollapsed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_context() {
        let err = ModelError::DanglingPointRef {
            entity: "joint",
            index: 2,
            point: 7,
        };
        assert!(err.to_string().contains("joint 2"));
        assert!(err.to_string().contains("point 7"));

        let err = StepError::SingularSystem {
            last_step: 41,
            time: 0.42,
        };
        assert!(err.to_string().contains("41"));
        assert_eq!(err.last_valid_step(), Some(41));
    }
}
