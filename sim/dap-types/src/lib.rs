//! Core types for the dap planar multibody solver.
//!
//! This crate provides the foundational records for describing a planar
//! (2D) constrained multibody system:
//!
//! - [`BodyInit`] - Mass properties and initial kinematic state of a rigid body
//! - [`PointInit`] / [`UnitVectorInit`] - Body-fixed anchor points and directions
//! - [`Joint`] - Kinematic constraints between bodies
//! - [`Force`] - Applied force elements (gravity, spring/dampers)
//! - [`DriverFunction`] - Prescribed time functions for driven coordinates
//! - [`SolverConfig`] - Time span, reporting step, integration method
//!
//! # Design Philosophy
//!
//! These types are **pure data**. They have no physics, no assembly logic,
//! no integration. They're the common language between:
//!
//! - The solver core (dap-core)
//! - Model builders (CAD front-ends, test fixtures, parameter studies)
//! - Logging and replay (serialized state trajectories)
//!
//! Entities reference each other by index into the registries of a model
//! description, never by pointer. Ground is an explicit [`BodyRef::Ground`]
//! variant rather than a sentinel index.
//!
//! # Coordinate System
//!
//! Motion takes place in the X-Y plane. A body's configuration is
//! `(r_x, r_y, p)`: position of the mass center and orientation angle in
//! radians, counterclockwise positive. All quantities are SI base units.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // Many methods can't be const due to nalgebra
    clippy::doc_markdown
)]

mod body;
mod config;
mod driver;
mod error;
mod force;
mod joint;
mod point;

pub use body::{BodyInit, BodyRef};
pub use config::{Integrator, SolverConfig};
pub use driver::DriverFunction;
pub use error::{ModelError, StepError};
pub use force::{damping_condition, DampingCondition, Force};
pub use joint::Joint;
pub use point::{PointInit, UnitVectorInit};
