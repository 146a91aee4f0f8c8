//! Main visualization plugin that ties all systems together.

use bevy::prelude::*;
use flow_core::{FlowConfig, LoopControl};

use crate::camera::CameraPlugin;
use crate::cells::CellPlugin;
use crate::controls::ControlsPlugin;
use crate::debug::DebugPlugin;
use crate::overlay::OverlayPlugin;
use crate::vessel::VesselPlugin;

const BACKGROUND: Color = Color::srgb(0.96, 0.96, 0.96);
const AMBIENT_BRIGHTNESS: f32 = 400.0;
const SUN_ILLUMINANCE: f32 = 3_000.0;

/// Per-frame ordering: read input, move the camera, then advance the cells.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowSet {
    Input,
    Camera,
    Simulate,
}

/// Main plugin for the blood flow visualization.
///
/// This plugin sets up the window, adds all sub-plugins, and configures
/// the frame ordering.
pub struct FlowVizPlugin;

impl Plugin for FlowVizPlugin {
    fn build(&self, app: &mut App) {
        // FlowConfig should be inserted by main.rs before adding this plugin
        if !app.world().contains_resource::<FlowConfig>() {
            app.init_resource::<FlowConfig>();
        }

        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Blood Flow".into(),
                resolution: (1280., 720.).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(BACKGROUND))
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: AMBIENT_BRIGHTNESS,
        })
        .init_resource::<LoopControl>()
        .configure_sets(
            Update,
            (FlowSet::Input, FlowSet::Camera, FlowSet::Simulate)
                .chain()
                .run_if(loop_running),
        )
        .add_systems(Startup, spawn_light)
        .add_plugins((
            ControlsPlugin,
            CameraPlugin,
            VesselPlugin,
            CellPlugin,
            OverlayPlugin,
            DebugPlugin,
        ));
    }
}

/// Run condition: the loop has not been stopped.
pub fn loop_running(control: Res<LoopControl>) -> bool {
    control.is_running()
}

/// Run condition: the simulation should advance this frame.
pub fn simulation_should_step(control: Res<LoopControl>) -> bool {
    control.should_step()
}

fn spawn_light(mut commands: Commands) {
    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: SUN_ILLUMINANCE,
            ..default()
        },
        transform: Transform::from_xyz(1.0, 1.0, 1.0).looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });
}
