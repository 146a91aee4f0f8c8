//! Debug overlay for development information display.
//!
//! Shows FPS, camera info, cell counts, and the frame counter.
//! Toggle with F3 key.

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::camera::CameraController;
use crate::cells::CellPopulation;
use flow_core::LoopControl;

/// Samples kept for the rolling FPS average.
const FPS_WINDOW: usize = 60;

/// Plugin for the debug overlay.
pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugOverlay>()
            .add_systems(Startup, setup_debug_overlay)
            .add_systems(Update, (toggle_debug_overlay, update_debug_display).chain());
    }
}

/// Resource controlling debug overlay settings.
#[derive(Resource)]
pub struct DebugOverlay {
    /// Whether the debug overlay is visible.
    pub enabled: bool,
    /// Show FPS counter.
    pub show_fps: bool,
    /// Show camera information.
    pub show_camera_info: bool,
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self {
            enabled: false,
            show_fps: true,
            show_camera_info: true,
        }
    }
}

/// Component marking the debug overlay container.
#[derive(Component)]
pub struct DebugOverlayContainer;

/// Component for the debug text.
#[derive(Component)]
pub struct DebugText;

/// Rolling window of recent frame rates.
#[derive(Default)]
struct FpsHistory {
    history: VecDeque<f32>,
}

impl FpsHistory {
    fn push(&mut self, fps: f32) {
        self.history.push_back(fps);
        if self.history.len() > FPS_WINDOW {
            self.history.pop_front();
        }
    }

    fn average(&self) -> f32 {
        if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f32>() / self.history.len() as f32
        }
    }
}

/// Snapshot of everything the overlay reports.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugStats {
    pub fps: f32,
    pub camera_distance: f32,
    pub camera_yaw: f32,
    pub camera_pitch: f32,
    pub live: usize,
    pub visible: usize,
    pub recycled: u64,
    pub frames: u64,
}

/// Format the overlay text.
pub fn debug_lines(overlay: &DebugOverlay, stats: &DebugStats) -> Vec<String> {
    let mut lines = Vec::new();

    if overlay.show_fps {
        let warning = if stats.fps < 30.0 { " LOW!" } else { "" };
        lines.push(format!("FPS: {:.0}{}", stats.fps, warning));
    }

    if overlay.show_camera_info {
        lines.push(format!("Camera distance: {:.0}", stats.camera_distance));
        lines.push(format!(
            "Yaw: {:.0}°  Pitch: {:.0}°",
            stats.camera_yaw.to_degrees(),
            stats.camera_pitch.to_degrees()
        ));
    }

    lines.push(format!("Cells: {} live, {} visible", stats.live, stats.visible));
    lines.push(format!("Recycled: {}", stats.recycled));
    lines.push(format!("Frame: {}", stats.frames));
    lines
}

/// System to set up the debug overlay UI.
fn setup_debug_overlay(mut commands: Commands) {
    commands
        .spawn((
            NodeBundle {
                style: Style {
                    position_type: PositionType::Absolute,
                    top: Val::Px(10.0),
                    left: Val::Px(10.0),
                    padding: UiRect::all(Val::Px(10.0)),
                    flex_direction: FlexDirection::Column,
                    ..default()
                },
                background_color: Color::srgba(0.0, 0.0, 0.0, 0.8).into(),
                visibility: Visibility::Hidden,
                ..default()
            },
            DebugOverlayContainer,
        ))
        .with_children(|parent| {
            parent.spawn(TextBundle::from_section(
                "DEBUG (F3 to toggle)",
                TextStyle {
                    font_size: 14.0,
                    color: Color::srgb(0.9, 0.9, 0.3),
                    ..default()
                },
            ));

            parent.spawn((
                TextBundle::from_section(
                    "",
                    TextStyle {
                        font_size: 12.0,
                        color: Color::srgb(0.8, 0.8, 0.8),
                        ..default()
                    },
                ),
                DebugText,
            ));
        });
}

/// System to toggle debug overlay with F3.
fn toggle_debug_overlay(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut debug_overlay: ResMut<DebugOverlay>,
    mut container: Query<&mut Visibility, With<DebugOverlayContainer>>,
) {
    if keyboard.just_pressed(KeyCode::F3) {
        debug_overlay.enabled = !debug_overlay.enabled;

        for mut visibility in container.iter_mut() {
            *visibility = if debug_overlay.enabled {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
        }

        let status = if debug_overlay.enabled { "ON" } else { "OFF" };
        tracing::info!("Debug overlay: {}", status);
    }
}

/// System to update debug display data.
fn update_debug_display(
    debug_overlay: Res<DebugOverlay>,
    camera: Res<CameraController>,
    population: Option<Res<CellPopulation>>,
    control: Res<LoopControl>,
    time: Res<Time>,
    mut fps_history: Local<FpsHistory>,
    mut debug_text: Query<&mut Text, With<DebugText>>,
) {
    let dt = time.delta_seconds();
    if dt > 0.0 {
        fps_history.push(1.0 / dt);
    }

    if !debug_overlay.enabled {
        return;
    }
    let Some(population) = population else {
        return;
    };

    let avg_fps = fps_history.average();
    let stats = DebugStats {
        fps: avg_fps,
        camera_distance: camera.current.distance,
        camera_yaw: camera.current.yaw,
        camera_pitch: camera.current.pitch,
        live: population.len(),
        visible: population.visible_count(),
        recycled: population.recycled(),
        frames: control.frames(),
    };
    let value = debug_lines(&debug_overlay, &stats).join("\n");

    for mut text in debug_text.iter_mut() {
        if let Some(section) = text.sections.first_mut() {
            section.value.clone_from(&value);
            section.style.color = if avg_fps < 30.0 {
                Color::srgb(1.0, 0.3, 0.3)
            } else if avg_fps < 55.0 {
                Color::srgb(1.0, 0.8, 0.3)
            } else {
                Color::srgb(0.8, 0.8, 0.8)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> DebugStats {
        DebugStats {
            fps: 60.0,
            camera_distance: 223.6,
            camera_yaw: 0.0,
            camera_pitch: 0.4636,
            live: 120,
            visible: 108,
            recycled: 7,
            frames: 300,
        }
    }

    #[test]
    fn test_debug_overlay_default() {
        let overlay = DebugOverlay::default();
        assert!(!overlay.enabled);
        assert!(overlay.show_fps);
        assert!(overlay.show_camera_info);
    }

    #[test]
    fn test_fps_history() {
        let mut history = FpsHistory::default();
        assert_eq!(history.average(), 0.0);

        history.push(60.0);
        history.push(60.0);
        assert_eq!(history.average(), 60.0);

        history.push(30.0);
        assert!((history.average() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_fps_history_keeps_window() {
        let mut history = FpsHistory::default();
        for _ in 0..FPS_WINDOW {
            history.push(10.0);
        }
        for _ in 0..FPS_WINDOW {
            history.push(60.0);
        }
        assert_eq!(history.average(), 60.0);
    }

    #[test]
    fn test_debug_lines() {
        let lines = debug_lines(&DebugOverlay::default(), &stats());

        assert_eq!(lines[0], "FPS: 60");
        assert!(lines.contains(&"Camera distance: 224".to_string()));
        assert!(lines.contains(&"Yaw: 0°  Pitch: 27°".to_string()));
        assert!(lines.contains(&"Cells: 120 live, 108 visible".to_string()));
        assert!(lines.contains(&"Recycled: 7".to_string()));
        assert!(lines.contains(&"Frame: 300".to_string()));
    }

    #[test]
    fn test_debug_lines_low_fps_and_hidden_sections() {
        let overlay = DebugOverlay {
            enabled: true,
            show_fps: true,
            show_camera_info: false,
        };
        let mut stats = stats();
        stats.fps = 20.0;

        let lines = debug_lines(&overlay, &stats);
        assert_eq!(lines[0], "FPS: 20 LOW!");
        assert!(!lines.iter().any(|l| l.starts_with("Camera")));
    }
}
