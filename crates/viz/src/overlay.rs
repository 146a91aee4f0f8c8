//! UI overlays: the control panel showing flow settings and key bindings.

use bevy::prelude::*;
use flow_core::{Category, CategoryVisibility, Census, LoopControl};

use crate::cells::CellPopulation;

/// Plugin for UI overlay rendering.
pub struct OverlayPlugin;

impl Plugin for OverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud)
            .add_systems(Update, update_hud);
    }
}

/// Component for the HUD text.
#[derive(Component)]
pub struct HudText;

/// Values shown on the control panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudState {
    pub flow_speed: f32,
    pub target_count: usize,
    pub census: Census,
    pub visibility: CategoryVisibility,
    pub paused: bool,
}

/// Render the control panel text.
pub fn hud_text(state: &HudState) -> String {
    let mut lines = vec![
        format!("Flow speed: {:.1}   [ / ]", state.flow_speed),
        format!(
            "Cells: {} ({} red, {} white, {} platelets)   - / =",
            state.target_count, state.census.red, state.census.white, state.census.platelet
        ),
    ];

    for (index, category) in Category::ALL.into_iter().enumerate() {
        let mark = if state.visibility.get(category) { "x" } else { " " };
        lines.push(format!("[{}] {} {}", mark, index + 1, category));
    }

    lines.push("R reset   Space pause   F3 debug   Esc quit".to_string());
    if state.paused {
        lines.push("PAUSED".to_string());
    }

    lines.join("\n")
}

fn setup_hud(mut commands: Commands) {
    commands
        .spawn(NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                top: Val::Px(10.0),
                right: Val::Px(10.0),
                padding: UiRect::all(Val::Px(10.0)),
                ..default()
            },
            background_color: Color::srgba(1.0, 1.0, 1.0, 0.8).into(),
            ..default()
        })
        .with_children(|parent| {
            parent.spawn((
                TextBundle::from_section(
                    "",
                    TextStyle {
                        font_size: 14.0,
                        color: Color::srgb(0.2, 0.2, 0.2),
                        ..default()
                    },
                ),
                HudText,
            ));
        });
}

/// Remember `state`, returning whether it differs from the last one shown.
fn hud_needs_refresh(shown: &mut Option<HudState>, state: HudState) -> bool {
    if shown.as_ref() == Some(&state) {
        return false;
    }
    *shown = Some(state);
    true
}

fn update_hud(
    population: Option<Res<CellPopulation>>,
    control: Res<LoopControl>,
    mut shown: Local<Option<HudState>>,
    mut hud: Query<&mut Text, With<HudText>>,
) {
    let Some(population) = population else {
        return;
    };

    let state = HudState {
        flow_speed: population.flow_speed(),
        target_count: population.target_count(),
        census: population.census(),
        visibility: population.visibility(),
        paused: control.is_paused(),
    };
    if !hud_needs_refresh(&mut shown, state) {
        return;
    }
    let value = hud_text(&state);
    for mut text in hud.iter_mut() {
        if let Some(section) = text.sections.first_mut() {
            section.value.clone_from(&value);
        }
    }
}
