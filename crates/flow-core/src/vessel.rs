//! Vessel geometry: the open tube the cells travel through along +Z.

use serde::{Deserialize, Serialize};

/// How far behind the tube entrance a reset cell may start.
pub const ENTRY_DEPTH: f32 = 50.0;
/// How far past the tube exit a cell travels before it is recycled.
pub const EXIT_MARGIN: f32 = 20.0;
/// Smallest gap between a freshly reset cell and the tube entrance.
const MIN_ENTRY_GAP: f32 = 0.01;

/// Cylinder centred on the origin with its axis along Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub length: f32,
    pub radius: f32,
}

impl Default for Vessel {
    fn default() -> Self {
        Self {
            length: 300.0,
            radius: 50.0,
        }
    }
}

impl Vessel {
    pub fn new(length: f32, radius: f32) -> Self {
        Self { length, radius }
    }

    /// Z of the tube entrance.
    pub fn entrance_z(&self) -> f32 {
        -self.length / 2.0
    }

    /// Z of the tube exit.
    pub fn exit_z(&self) -> f32 {
        self.length / 2.0
    }

    /// Lowest z a live cell can have.
    pub fn min_z(&self) -> f32 {
        self.entrance_z() - ENTRY_DEPTH
    }

    /// Cells beyond this z are recycled.
    pub fn recycle_z(&self) -> f32 {
        self.exit_z() + EXIT_MARGIN
    }

    /// Check if a z coordinate lies within the live range.
    pub fn contains_z(&self, z: f32) -> bool {
        z >= self.min_z() && z <= self.recycle_z()
    }

    /// Radius of the disc a cell of `base_size` may start in.
    pub fn spawn_radius(&self, base_size: f32) -> f32 {
        (self.radius - 2.0 * base_size).max(0.0)
    }

    /// Starting z for a cell that is `depth` units behind the entrance.
    ///
    /// The result is always strictly behind the entrance.
    pub fn entry_z(&self, depth: f32) -> f32 {
        let entrance = self.entrance_z();
        let z = entrance - depth.clamp(MIN_ENTRY_GAP, ENTRY_DEPTH);
        if z < entrance {
            z
        } else {
            // The gap vanished in rounding on a long vessel.
            step_down(entrance)
        }
    }
}

/// Largest f32 strictly below `x`.
fn step_down(x: f32) -> f32 {
    if x.is_nan() || x == f32::NEG_INFINITY {
        x
    } else if x == 0.0 {
        -f32::from_bits(1)
    } else if x > 0.0 {
        f32::from_bits(x.to_bits() - 1)
    } else {
        f32::from_bits(x.to_bits() + 1)
    }
}
