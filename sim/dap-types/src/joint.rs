//! Kinematic joint records.

use crate::BodyRef;
use serde::{Deserialize, Serialize};

/// A kinematic constraint between bodies.
///
/// Each variant carries only the fields relevant to its kind. Anchor points
/// and sliding axes are indices into the point and unit-vector registries;
/// the bodies a joint connects are resolved from its anchors at assembly
/// time (except for the variants that reference bodies directly).
///
/// Constraint rows are assigned contiguously in joint-registration order,
/// which fixes the global row ordering of the constraint Jacobian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Joint {
    /// Pin joint: the two anchor points coincide in the world frame
    /// (2 equations). With `fixed`, the relative angle is additionally
    /// locked at its initial value (+1 equation), turning the pin into a
    /// rigid attachment.
    Revolute {
        /// Anchor point on the first body.
        i_point: usize,
        /// Anchor point on the second body.
        j_point: usize,
        /// Lock the relative rotation at the assembly-time value.
        fixed: bool,
    },

    /// Sliding joint: the second anchor stays on the line through the first
    /// anchor along a body-fixed axis, and the relative angle is locked
    /// (2 equations). With `fixed`, the travel along the axis is
    /// additionally frozen at its initial value (+1 equation).
    Translational {
        /// Anchor point on the first body.
        i_point: usize,
        /// Anchor point on the second body.
        j_point: usize,
        /// Sliding axis, a unit vector on the first body.
        i_uvec: usize,
        /// Lock the travel along the axis at the assembly-time value.
        fixed: bool,
    },

    /// Massless-link abstraction of two revolute joints: the two anchor
    /// points keep a constant distance (1 equation).
    RevoluteRevolute {
        /// Anchor point on the first body.
        i_point: usize,
        /// Anchor point on the second body.
        j_point: usize,
        /// Link length in m. Must be strictly positive.
        length: f64,
    },

    /// Revolute-translational composite: the second anchor keeps a constant
    /// perpendicular offset from the axis line on the first body
    /// (1 equation).
    RevoluteTranslational {
        /// Anchor point on the first body, a point on the axis line.
        i_point: usize,
        /// Anchor point on the second body.
        j_point: usize,
        /// Axis direction, a unit vector on the first body.
        i_uvec: usize,
        /// Signed perpendicular distance from the axis line in m.
        distance: f64,
    },

    /// Prescribes the relative orientation of two bodies (1 equation).
    /// With a driver the angle follows `f(t)`; without one it is frozen at
    /// its assembly-time value.
    RelativeRotation {
        /// First body (or ground).
        i_body: BodyRef,
        /// Second body (or ground).
        j_body: BodyRef,
        /// Optional driver function index.
        driver: Option<usize>,
    },

    /// Prescribes the distance between two anchor points (1 equation).
    /// With a driver the distance follows `f(t)`; without one it is frozen
    /// at its assembly-time value.
    RelativeTranslation {
        /// Anchor point on the first body.
        i_point: usize,
        /// Anchor point on the second body.
        j_point: usize,
        /// Optional driver function index.
        driver: Option<usize>,
    },

    /// Disc rolling without slip on the ground line `y = 0` (2 equations):
    /// the center height stays at the radius and the x-travel is tied to
    /// the rotation.
    Disc {
        /// The rolling body.
        body: usize,
        /// Disc radius in m. Must be strictly positive.
        radius: f64,
    },

    /// Rigid weld: locks both the relative position and the relative
    /// orientation of two bodies at their assembly-time values
    /// (3 equations).
    Rigid {
        /// First body (or ground).
        i_body: BodyRef,
        /// Second body (or ground).
        j_body: BodyRef,
    },
}

impl Joint {
    /// Number of constraint equations this joint contributes.
    #[must_use]
    pub fn mrows(&self) -> usize {
        match self {
            Self::Revolute { fixed, .. } | Self::Translational { fixed, .. } => {
                if *fixed {
                    3
                } else {
                    2
                }
            }
            Self::RevoluteRevolute { .. }
            | Self::RevoluteTranslational { .. }
            | Self::RelativeRotation { .. }
            | Self::RelativeTranslation { .. } => 1,
            Self::Disc { .. } => 2,
            Self::Rigid { .. } => 3,
        }
    }

    /// Number of bodies involved (1 or 2), counting ground. Only the disc
    /// joint is single-body; every other kind connects two references,
    /// either of which may be ground.
    #[must_use]
    pub fn nbody(&self) -> usize {
        match self {
            Self::Disc { .. } => 1,
            _ => 2,
        }
    }

    /// Short kind name for diagnostics, matching the traditional DAP
    /// vocabulary.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Revolute { .. } => "rev",
            Self::Translational { .. } => "tran",
            Self::RevoluteRevolute { .. } => "rev-rev",
            Self::RevoluteTranslational { .. } => "rev-tran",
            Self::RelativeRotation { .. } => "rel-rot",
            Self::RelativeTranslation { .. } => "rel-tran",
            Self::Disc { .. } => "disc",
            Self::Rigid { .. } => "rigid",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_counts_match_joint_type_table() {
        let rev = Joint::Revolute {
            i_point: 0,
            j_point: 1,
            fixed: false,
        };
        assert_eq!(rev.mrows(), 2);
        assert_eq!(rev.nbody(), 2);

        let rev_fixed = Joint::Revolute {
            i_point: 0,
            j_point: 1,
            fixed: true,
        };
        assert_eq!(rev_fixed.mrows(), 3);

        let disc = Joint::Disc {
            body: 0,
            radius: 0.3,
        };
        assert_eq!(disc.mrows(), 2);
        assert_eq!(disc.nbody(), 1);

        // Relative joints connect two references, moving or ground.
        let rel_rot = Joint::RelativeRotation {
            i_body: BodyRef::Body(0),
            j_body: BodyRef::Body(1),
            driver: None,
        };
        assert_eq!(rel_rot.nbody(), 2);
        let rel_tran = Joint::RelativeTranslation {
            i_point: 0,
            j_point: 1,
            driver: None,
        };
        assert_eq!(rel_tran.nbody(), 2);

        let rigid = Joint::Rigid {
            i_body: BodyRef::Body(0),
            j_body: BodyRef::Ground,
        };
        assert_eq!(rigid.mrows(), 3);
        assert_eq!(rigid.kind(), "rigid");
    }
}
