//! Core blood flow logic: cell categories, kinematics, and population management.
//!
//! Nothing in this crate renders. The population talks to whatever draws the
//! cells through the [`Scene`] trait, so the same code drives the Bevy viewer,
//! the headless runner, and the tests.

pub mod blueprint;
pub mod category;
pub mod cell;
pub mod config;
pub mod frame;
pub mod population;
pub mod scene;
pub mod vessel;

pub use blueprint::{blueprint, Blueprint, Part};
pub use category::{Category, CategoryProfile, CategoryVisibility};
pub use cell::{CellState, Pose, Step, Wobble};
pub use config::{
    default_config_toml, CameraConfig, ConfigError, FlowConfig, FlowSettings, VesselConfig,
};
pub use frame::LoopControl;
pub use population::{split_counts, Census, Cell, Population};
pub use scene::{LedgerEntry, LedgerHandle, LedgerScene, Scene};
pub use vessel::Vessel;
