//! Keyboard controls for flow speed, cell count, visibility, and the loop.

use bevy::prelude::*;
use flow_core::{Category, LoopControl, Population};

use crate::cells::{BevyScene, CellPopulation};
use crate::plugin::FlowSet;

/// Plugin for user controls.
pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ControlEvent>().add_systems(
            Update,
            (read_control_keys, apply_control_events)
                .chain()
                .in_set(FlowSet::Input),
        );
    }
}

/// A request to change the running simulation.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    SetFlowSpeed(f32),
    /// Change the population size; triggers a rebuild.
    SetCellCount(usize),
    SetVisibility { category: Category, visible: bool },
    /// Restore the configured speed, count and visibility.
    Reset,
    TogglePause,
    /// Stop the loop and exit.
    Stop,
}

/// Key to category bindings for visibility toggles.
const VISIBILITY_KEYS: [(KeyCode, Category); 3] = [
    (KeyCode::Digit1, Category::Red),
    (KeyCode::Digit2, Category::White),
    (KeyCode::Digit3, Category::Platelet),
];

/// Translate this frame's key presses into control events.
pub fn events_for_keys<H>(
    keys: &ButtonInput<KeyCode>,
    population: &Population<H>,
) -> Vec<ControlEvent> {
    let settings = population.settings();
    let mut events = Vec::new();

    if keys.just_pressed(KeyCode::BracketRight) {
        events.push(ControlEvent::SetFlowSpeed(round_step(
            population.flow_speed() + settings.flow_speed_step,
        )));
    }
    if keys.just_pressed(KeyCode::BracketLeft) {
        events.push(ControlEvent::SetFlowSpeed(round_step(
            population.flow_speed() - settings.flow_speed_step,
        )));
    }

    if keys.just_pressed(KeyCode::Equal) {
        events.push(ControlEvent::SetCellCount(
            population.target_count() + settings.cell_count_step,
        ));
    }
    if keys.just_pressed(KeyCode::Minus) {
        events.push(ControlEvent::SetCellCount(
            population
                .target_count()
                .saturating_sub(settings.cell_count_step),
        ));
    }

    let visibility = population.visibility();
    for (key, category) in VISIBILITY_KEYS {
        if keys.just_pressed(key) {
            events.push(ControlEvent::SetVisibility {
                category,
                visible: !visibility.get(category),
            });
        }
    }

    if keys.just_pressed(KeyCode::KeyR) {
        events.push(ControlEvent::Reset);
    }
    if keys.just_pressed(KeyCode::Space) {
        events.push(ControlEvent::TogglePause);
    }
    if keys.just_pressed(KeyCode::Escape) {
        events.push(ControlEvent::Stop);
    }

    events
}

/// Snap a stepped slider value to two decimals so repeated steps don't drift.
fn round_step(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

fn read_control_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    population: Res<CellPopulation>,
    mut events: EventWriter<ControlEvent>,
) {
    events.send_batch(events_for_keys(&keyboard, &population.0));
}

fn apply_control_events(
    mut events: EventReader<ControlEvent>,
    mut commands: Commands,
    mut population: ResMut<CellPopulation>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut control: ResMut<LoopControl>,
    mut exit: EventWriter<AppExit>,
) {
    let mut scene = BevyScene::new(&mut commands, &mut meshes, &mut materials);

    for event in events.read() {
        match *event {
            ControlEvent::SetFlowSpeed(speed) => {
                let applied = population.set_flow_speed(speed);
                tracing::info!("Flow speed: {:.2}", applied);
            }
            ControlEvent::SetCellCount(count) => {
                let before = population.target_count();
                let applied = population.set_target_count(count);
                if applied == before {
                    tracing::warn!("Cell count already at {}", applied);
                } else {
                    population.rebuild(&mut scene);
                }
            }
            ControlEvent::SetVisibility { category, visible } => {
                population.set_category_visibility(category, visible, &mut scene);
                tracing::info!("{}: {}", category, if visible { "shown" } else { "hidden" });
            }
            ControlEvent::Reset => {
                population.restore_defaults(&mut scene);
            }
            ControlEvent::TogglePause => {
                let paused = control.toggle_pause();
                tracing::info!("Simulation {}", if paused { "paused" } else { "resumed" });
            }
            ControlEvent::Stop => {
                control.stop();
                exit.send(AppExit::Success);
                tracing::info!("Stop requested");
            }
        }
    }
}
