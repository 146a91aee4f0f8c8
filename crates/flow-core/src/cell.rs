//! Per-cell kinematic state: spawn/reset draws and the per-frame advance.

use bevy_math::{Vec2, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

use crate::category::Category;
use crate::vessel::{Vessel, ENTRY_DEPTH};

/// Slow sinusoidal drift applied to the rendered x/y position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wobble {
    /// Angular rate in radians per second.
    pub rate: f32,
    /// Peak offset in world units.
    pub amplitude: f32,
    /// Phase offset in radians.
    pub phase: f32,
}

impl Wobble {
    /// Offset at `time` seconds. Computed in f64 so large clock values keep precision.
    pub fn offset(&self, time: f64) -> Vec2 {
        let angle = time * f64::from(self.rate) + f64::from(self.phase);
        let amplitude = f64::from(self.amplitude);
        Vec2::new(
            (angle.sin() * amplitude) as f32,
            (angle.cos() * amplitude) as f32,
        )
    }
}

/// Where and how a renderable should be drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    /// Euler angles (XYZ order) in radians.
    pub rotation: Vec3,
    /// Uniform scale, equal to the cell size.
    pub scale: f32,
}

/// Outcome of one [`CellState::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Pose to write to the renderable.
    pub pose: Pose,
    /// The cell passed the far end and was sent back to the start.
    pub recycled: bool,
}

/// Kinematic state of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellState {
    category: Category,
    /// Logical position, never perturbed by wobble.
    pub position: Vec3,
    pub size: f32,
    /// Per-cell speed, multiplied by the flow speed again on every advance.
    pub speed: f32,
    pub orientation: Vec3,
    pub rotation_rate: Vec3,
    pub wobble: Wobble,
}

impl CellState {
    /// Create a cell with freshly drawn parameters.
    pub fn spawn<R: Rng + ?Sized>(
        category: Category,
        rng: &mut R,
        vessel: &Vessel,
        flow_speed: f32,
    ) -> Self {
        let mut cell = Self {
            category,
            position: Vec3::ZERO,
            size: category.profile().base_size,
            speed: flow_speed,
            orientation: Vec3::ZERO,
            rotation_rate: Vec3::ZERO,
            wobble: Wobble {
                rate: 0.0,
                amplitude: 0.0,
                phase: 0.0,
            },
        };
        cell.reset(rng, vessel, flow_speed);
        cell
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Send the cell back behind the tube entrance with new random parameters.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R, vessel: &Vessel, flow_speed: f32) {
        let base_size = self.category.profile().base_size;

        let angle = rng.gen_range(0.0..TAU);
        let radius = vessel.spawn_radius(base_size) * rng.gen::<f32>().sqrt();
        let depth = ENTRY_DEPTH * (1.0 - rng.gen::<f32>());
        self.position = Vec3::new(
            angle.cos() * radius,
            angle.sin() * radius,
            vessel.entry_z(depth),
        );

        self.size = base_size * rng.gen_range(0.8f32..=1.2);
        self.speed = flow_speed * rng.gen_range(0.8f32..=1.3);

        self.orientation = Vec3::new(
            rng.gen_range(0.0..TAU),
            rng.gen_range(0.0..TAU),
            rng.gen_range(0.0..TAU),
        );
        self.rotation_rate = Vec3::new(
            rng.gen_range(-0.01..=0.01),
            rng.gen_range(-0.01..=0.01),
            rng.gen_range(-0.01..=0.01),
        );

        self.wobble = Wobble {
            rate: rng.gen_range(0.005..=0.015),
            amplitude: rng.gen_range(0.2..=0.7),
            phase: rng.gen_range(0.0..TAU),
        };
    }

    /// Move the cell one frame downstream.
    ///
    /// Returns the pose computed before any recycle, so the renderable shows
    /// the cell at the point it left the tube.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        flow_speed: f32,
        time: f64,
        vessel: &Vessel,
        rng: &mut R,
    ) -> Step {
        self.position.z += self.speed * flow_speed;
        self.orientation = (self.orientation + self.rotation_rate * flow_speed)
            .to_array()
            .map(wrap_angle)
            .into();

        let pose = self.pose(time);

        let recycled = self.position.z > vessel.recycle_z();
        if recycled {
            self.reset(rng, vessel, flow_speed);
        }

        Step { pose, recycled }
    }

    /// Rendered pose at `time`, with wobble applied to x/y.
    pub fn pose(&self, time: f64) -> Pose {
        let wobble = self.wobble.offset(time);
        Pose {
            position: Vec3::new(
                self.position.x + wobble.x,
                self.position.y + wobble.y,
                self.position.z,
            ),
            rotation: self.orientation,
            scale: self.size,
        }
    }
}

/// Wrap an angle into `[0, TAU)`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}
