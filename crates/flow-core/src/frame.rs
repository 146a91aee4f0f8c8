//! Frame loop control: stop, pause, and frame counting.

use bevy_ecs::prelude::Resource;

/// Gate checked at the top of every frame step.
///
/// Stopping is permanent; pausing only freezes the simulation, so camera
/// controls keep working.
#[derive(Resource, Debug, Default, Clone, PartialEq, Eq)]
pub struct LoopControl {
    stopped: bool,
    paused: bool,
    frames: u64,
    /// Stop automatically once this many frames have been simulated.
    frame_limit: Option<u64>,
}

impl LoopControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// A loop that stops itself after `frames` simulated frames.
    pub fn with_frame_limit(frames: u64) -> Self {
        Self {
            frame_limit: Some(frames),
            stopped: frames == 0,
            ..Self::default()
        }
    }

    /// Whether the loop should keep scheduling frames at all.
    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    /// Whether the simulation should advance this frame.
    pub fn should_step(&self) -> bool {
        !self.stopped && !self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Halt the loop for good.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Flip the pause flag, returning the new state.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Count one simulated frame, stopping if the frame limit is reached.
    pub fn record_frame(&mut self) {
        self.frames += 1;
        if self.frame_limit.is_some_and(|limit| self.frames >= limit) {
            self.stopped = true;
        }
    }

    /// Frames simulated so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
