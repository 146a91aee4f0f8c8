//! Visualization layer: Bevy-based renderer for the blood flow.

pub mod camera;
pub mod cells;
pub mod controls;
pub mod debug;
pub mod headless;
pub mod overlay;
pub mod plugin;
pub mod vessel;

pub use headless::{HeadlessPlugin, HeadlessReport};
pub use plugin::{FlowSet, FlowVizPlugin};
