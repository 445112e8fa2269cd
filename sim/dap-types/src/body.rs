//! Rigid body input records and body references.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Reference to a body in a model description.
///
/// Ground is explicit rather than a `-1` sentinel: it is never integrated,
/// has identity kinematics (`r = 0`, `p = 0`, `A = I`), and contributes no
/// columns to the constraint Jacobian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyRef {
    /// The stationary world frame.
    Ground,
    /// A moving body, by index into the body registry.
    Body(usize),
}

impl BodyRef {
    /// Returns the body index, or `None` for ground.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Ground => None,
            Self::Body(i) => Some(i),
        }
    }

    /// True if this reference is the ground frame.
    #[must_use]
    pub fn is_ground(self) -> bool {
        matches!(self, Self::Ground)
    }
}

/// Mass properties and initial state of a planar rigid body.
///
/// Positions refer to the body's mass center; `p` is the orientation angle
/// in radians (counterclockwise positive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyInit {
    /// Mass in kg. Must be strictly positive.
    pub mass: f64,
    /// Polar moment of inertia about the mass center in kg·m². Must be
    /// strictly positive.
    pub inertia: f64,
    /// Initial mass-center position in m.
    pub r: Vector2<f64>,
    /// Initial orientation angle in rad.
    pub p: f64,
    /// Initial linear velocity in m/s.
    pub r_d: Vector2<f64>,
    /// Initial angular velocity in rad/s.
    pub p_d: f64,
    /// Optional display name, used in diagnostics.
    pub name: Option<String>,
}

impl BodyInit {
    /// Create a body at rest at the given position and orientation.
    #[must_use]
    pub fn at_rest(mass: f64, inertia: f64, r: Vector2<f64>, p: f64) -> Self {
        Self {
            mass,
            inertia,
            r,
            p,
            r_d: Vector2::zeros(),
            p_d: 0.0,
            name: None,
        }
    }

    /// Set the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, r_d: Vector2<f64>, p_d: f64) -> Self {
        self.r_d = r_d;
        self.p_d = p_d;
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_ref_index() {
        assert_eq!(BodyRef::Ground.index(), None);
        assert_eq!(BodyRef::Body(3).index(), Some(3));
        assert!(BodyRef::Ground.is_ground());
        assert!(!BodyRef::Body(0).is_ground());
    }

    #[test]
    fn body_builder() {
        let b = BodyInit::at_rest(2.0, 0.5, Vector2::new(1.0, -1.0), 0.1)
            .with_velocity(Vector2::new(0.0, 3.0), -0.2)
            .named("crank");
        assert_eq!(b.mass, 2.0);
        assert_eq!(b.r_d.y, 3.0);
        assert_eq!(b.name.as_deref(), Some("crank"));
    }
}
