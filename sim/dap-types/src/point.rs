//! Body-fixed anchor points and unit vectors.

use crate::BodyRef;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A point fixed in a body's local frame, used to anchor joints and force
/// elements.
///
/// For a ground point the local offset *is* the world position; it never
/// moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointInit {
    /// Owning body (or ground).
    pub body: BodyRef,
    /// Offset from the owning body's mass center, in the body frame (m).
    pub s_local: Vector2<f64>,
    /// Optional display name, used in diagnostics.
    pub name: Option<String>,
}

impl PointInit {
    /// Create a point on the given body.
    #[must_use]
    pub fn new(body: BodyRef, s_local: Vector2<f64>) -> Self {
        Self {
            body,
            s_local,
            name: None,
        }
    }

    /// Create a stationary ground point at the given world position.
    #[must_use]
    pub fn ground(position: Vector2<f64>) -> Self {
        Self::new(BodyRef::Ground, position)
    }

    /// Set the display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A direction fixed in a body's local frame, used by translational-type
/// joints to define a sliding axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitVectorInit {
    /// Owning body (or ground).
    pub body: BodyRef,
    /// Direction in the body frame. Normalized at assembly time.
    pub u_local: Vector2<f64>,
}

impl UnitVectorInit {
    /// Create a unit vector on the given body.
    #[must_use]
    pub fn new(body: BodyRef, u_local: Vector2<f64>) -> Self {
        Self { body, u_local }
    }
}
