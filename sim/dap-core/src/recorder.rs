//! Trajectory recording.
//!
//! One [`Frame`] per reporting step, snapshotting everything a
//! post-processor needs: body states through accelerations, world anchor
//! point positions and velocities, and the energy terms. Frames serialize
//! with serde so runs can be dumped for plotting or regression comparison.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::data::Data;

/// Snapshot of the simulation state at one reporting step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Simulation time in s.
    pub time: f64,
    /// Body mass-center positions.
    pub body_r: Vec<Vector2<f64>>,
    /// Body orientation angles.
    pub body_p: Vec<f64>,
    /// Body linear velocities.
    pub body_r_d: Vec<Vector2<f64>>,
    /// Body angular velocities.
    pub body_p_d: Vec<f64>,
    /// Body linear accelerations.
    pub body_r_dd: Vec<Vector2<f64>>,
    /// Body angular accelerations.
    pub body_p_dd: Vec<f64>,
    /// World positions of every anchor point.
    pub point_r: Vec<Vector2<f64>>,
    /// World velocities of every anchor point.
    pub point_r_d: Vec<Vector2<f64>>,
    /// Kinetic energy.
    pub energy_kinetic: f64,
    /// Potential energy (gravity + springs).
    pub energy_potential: f64,
}

impl Frame {
    /// Snapshot the current state. Assumes derived fields are fresh, which
    /// holds after [`Data::step`] or an initial refresh.
    #[must_use]
    pub fn capture(data: &Data) -> Self {
        Self {
            time: data.time,
            body_r: data.r.clone(),
            body_p: data.p.clone(),
            body_r_d: data.r_d.clone(),
            body_p_d: data.p_d.clone(),
            body_r_dd: data.r_dd.clone(),
            body_p_dd: data.p_dd.clone(),
            point_r: data.point_r.clone(),
            point_r_d: data.point_r_d.clone(),
            energy_kinetic: data.energy_kinetic,
            energy_potential: data.energy_potential,
        }
    }

    /// Total mechanical energy at this frame.
    #[must_use]
    pub fn energy_total(&self) -> f64 {
        self.energy_kinetic + self.energy_potential
    }
}

/// Full recorded run: the initial state plus one frame per completed step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Recorded frames in time order.
    pub frames: Vec<Frame>,
}

impl Trajectory {
    /// Empty trajectory with room for a full run.
    #[must_use]
    pub fn with_capacity(n_frames: usize) -> Self {
        Self {
            frames: Vec::with_capacity(n_frames),
        }
    }

    /// Append a snapshot of the current state.
    pub fn record(&mut self, data: &Data) {
        self.frames.push(Frame::capture(data));
    }

    /// The most recent frame, if any step has been recorded.
    #[must_use]
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Time series of one body's mass-center position.
    #[must_use]
    pub fn body_positions(&self, body: usize) -> Vec<(f64, Vector2<f64>)> {
        self.frames
            .iter()
            .map(|f| (f.time, f.body_r[body]))
            .collect()
    }

    /// Time series of total mechanical energy.
    #[must_use]
    pub fn energy_series(&self) -> Vec<(f64, f64)> {
        self.frames
            .iter()
            .map(|f| (f.time, f.energy_total()))
            .collect()
    }
}
