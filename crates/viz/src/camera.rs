//! Camera system: orbit controller, transitions, and user input handling.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use flow_core::{CameraConfig, FlowConfig};
use std::f32::consts::{PI, TAU};

use crate::plugin::FlowSet;

/// Radians of orbit per pixel of mouse drag.
const DRAG_SPEED: f32 = 0.005;
/// Radians of orbit per second while an arrow key is held.
const KEY_ORBIT_SPEED: f32 = 1.5;
/// Fraction of the distance covered per wheel line.
const WHEEL_ZOOM_STEP: f32 = 0.1;
/// Fraction of the distance covered per second while PageUp/PageDown is held.
const KEY_ZOOM_SPEED: f32 = 0.8;
/// Pixels per line for high-resolution scroll devices.
const PIXELS_PER_LINE: f32 = 100.0;
/// Stay short of the poles so `looking_at` keeps a stable up vector.
const MAX_PITCH: f32 = 1.55;
/// Length of the eased return to the home view, in seconds.
const HOME_TRANSITION_SECS: f32 = 0.5;

/// Plugin for camera control and movement.
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraController>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (
                    handle_mouse_input,
                    handle_keyboard_input,
                    update_camera_transition,
                    apply_camera_to_transform,
                )
                    .chain()
                    .in_set(FlowSet::Camera),
            );
    }
}

/// Spherical camera placement around the focus point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitPose {
    /// Rotation about +Y, zero looking down -Z from +Z.
    pub yaw: f32,
    /// Elevation above the XZ plane.
    pub pitch: f32,
    pub distance: f32,
}

impl OrbitPose {
    /// Describe a world position as seen from the origin.
    pub fn from_position(position: Vec3) -> Self {
        let distance = position.length();
        if distance <= f32::EPSILON {
            return Self {
                yaw: 0.0,
                pitch: 0.0,
                distance: 0.0,
            };
        }
        Self {
            yaw: position.x.atan2(position.z),
            pitch: (position.y / distance).clamp(-1.0, 1.0).asin(),
            distance,
        }
    }

    /// Camera position relative to the focus point.
    pub fn offset(&self) -> Vec3 {
        let horizontal = self.distance * self.pitch.cos();
        Vec3::new(
            horizontal * self.yaw.sin(),
            self.distance * self.pitch.sin(),
            horizontal * self.yaw.cos(),
        )
    }

    /// Interpolate toward `other`, turning the short way round in yaw.
    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            yaw: wrap_angle(self.yaw + wrap_angle(other.yaw - self.yaw) * t),
            pitch: self.pitch + (other.pitch - self.pitch) * t,
            distance: self.distance + (other.distance - self.distance) * t,
        }
    }
}

/// Wrap an angle into (-π, π].
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped - TAU
    } else {
        wrapped
    }
}

/// Main camera controller resource.
#[derive(Resource, Debug)]
pub struct CameraController {
    /// Point the camera orbits and looks at.
    pub focus: Vec3,
    /// Pose applied this frame.
    pub current: OrbitPose,
    /// Pose the damping is easing toward.
    pub target: OrbitPose,
    /// Pose restored by the Home key.
    pub home: OrbitPose,
    pub constraints: CameraConstraints,
    /// Active camera transition, if any.
    pub transition: Option<CameraTransition>,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl CameraController {
    /// Build a controller at the configured starting position.
    pub fn from_config(config: &CameraConfig) -> Self {
        let constraints = CameraConstraints {
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            max_pitch: MAX_PITCH,
            damping: config.damping,
        };
        let home = constraints.clamp(OrbitPose::from_position(Vec3::from_array(config.position)));
        Self {
            focus: Vec3::ZERO,
            current: home,
            target: home,
            home,
            constraints,
            transition: None,
        }
    }

    /// World position of the camera for the current pose.
    pub fn position(&self) -> Vec3 {
        self.focus + self.current.offset()
    }

    /// Rotate the target pose, cancelling any transition.
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.transition = None;
        self.target.yaw = wrap_angle(self.target.yaw + delta_yaw);
        self.target.pitch += delta_pitch;
        self.target = self.constraints.clamp(self.target);
    }

    /// Scale the target distance by `factor`, cancelling any transition.
    pub fn zoom(&mut self, factor: f32) {
        self.transition = None;
        self.target.distance *= factor;
        self.target = self.constraints.clamp(self.target);
    }

    /// Begin a smooth transition to a new pose.
    pub fn begin_transition(&mut self, to: OrbitPose, duration: f32) {
        self.transition = Some(CameraTransition {
            from: self.current,
            to: self.constraints.clamp(to),
            duration,
            elapsed: 0.0,
        });
    }

    /// Ease back to the starting view.
    pub fn go_home(&mut self) {
        self.begin_transition(self.home, HOME_TRANSITION_SECS);
    }

    /// Advance transitions and damping by `delta` seconds.
    pub fn update(&mut self, delta: f32) {
        if let Some(transition) = self.transition.as_mut() {
            transition.elapsed += delta;
            if transition.is_complete() {
                let to = transition.to;
                self.current = to;
                self.target = to;
                self.transition = None;
            } else {
                self.current = transition.current_pose();
            }
            return;
        }

        let t = self.constraints.smoothing(delta);
        self.current = self.current.lerp(self.target, t);
    }
}

/// Limits on how the camera may move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraConstraints {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest absolute pitch in radians.
    pub max_pitch: f32,
    /// Fraction of the remaining motion applied per 60 Hz frame.
    pub damping: f32,
}

impl CameraConstraints {
    /// Clamp a distance to the valid range.
    pub fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.min_distance, self.max_distance)
    }

    /// Clamp a pose's pitch and distance.
    pub fn clamp(&self, pose: OrbitPose) -> OrbitPose {
        OrbitPose {
            yaw: pose.yaw,
            pitch: pose.pitch.clamp(-self.max_pitch, self.max_pitch),
            distance: self.clamp_distance(pose.distance),
        }
    }

    /// Interpolation factor for a frame of `delta` seconds.
    ///
    /// Equals `damping` at 60 Hz and stays frame-rate independent.
    pub fn smoothing(&self, delta: f32) -> f32 {
        let damping = self.damping.clamp(0.0, 1.0);
        1.0 - (1.0 - damping).powf(delta * 60.0)
    }
}

/// Active camera transition state.
#[derive(Clone, Debug)]
pub struct CameraTransition {
    pub from: OrbitPose,
    pub to: OrbitPose,
    /// Total duration in seconds.
    pub duration: f32,
    /// Time elapsed so far.
    pub elapsed: f32,
}

impl CameraTransition {
    /// Get the progress of this transition (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    /// Check if this transition is complete.
    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Get the current pose based on progress.
    pub fn current_pose(&self) -> OrbitPose {
        self.from.lerp(self.to, ease_in_out(self.progress()))
    }
}

/// Smooth ease-in-out function for transitions.
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Marker component for the main camera.
#[derive(Component)]
pub struct MainCamera;

/// System to set up the camera on startup.
fn setup_camera(
    mut commands: Commands,
    config: Res<FlowConfig>,
    mut controller: ResMut<CameraController>,
) {
    let camera = &config.camera;
    *controller = CameraController::from_config(camera);

    commands.spawn((
        Camera3dBundle {
            projection: PerspectiveProjection {
                fov: camera.fov_degrees.to_radians(),
                near: camera.near,
                far: camera.far,
                ..default()
            }
            .into(),
            transform: Transform::from_translation(controller.position())
                .looking_at(controller.focus, Vec3::Y),
            ..default()
        },
        MainCamera,
    ));
}

/// System to handle mouse input (orbit and zoom).
fn handle_mouse_input(
    mut controller: ResMut<CameraController>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll: EventReader<MouseWheel>,
) {
    if mouse_button.pressed(MouseButton::Left) {
        let mut delta = Vec2::ZERO;
        for motion in mouse_motion.read() {
            delta += motion.delta;
        }

        if delta != Vec2::ZERO {
            controller.orbit(-delta.x * DRAG_SPEED, delta.y * DRAG_SPEED);
        }
    } else {
        mouse_motion.clear();
    }

    for ev in scroll.read() {
        let lines = match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y / PIXELS_PER_LINE,
        };
        if lines != 0.0 {
            controller.zoom((1.0 - WHEEL_ZOOM_STEP).powf(lines));
        }
    }
}

/// System to handle keyboard input for camera controls.
fn handle_keyboard_input(
    mut controller: ResMut<CameraController>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let delta = time.delta_seconds();

    let mut yaw = 0.0;
    let mut pitch = 0.0;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        yaw -= KEY_ORBIT_SPEED * delta;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        yaw += KEY_ORBIT_SPEED * delta;
    }
    if keyboard.pressed(KeyCode::ArrowUp) {
        pitch += KEY_ORBIT_SPEED * delta;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        pitch -= KEY_ORBIT_SPEED * delta;
    }
    if yaw != 0.0 || pitch != 0.0 {
        controller.orbit(yaw, pitch);
    }

    if keyboard.pressed(KeyCode::PageUp) {
        controller.zoom(1.0 - KEY_ZOOM_SPEED * delta);
    }
    if keyboard.pressed(KeyCode::PageDown) {
        controller.zoom(1.0 + KEY_ZOOM_SPEED * delta);
    }

    if keyboard.just_pressed(KeyCode::Home) {
        controller.go_home();
    }
}

/// System to update camera transitions and damping.
fn update_camera_transition(mut controller: ResMut<CameraController>, time: Res<Time>) {
    controller.update(time.delta_seconds());
}

/// System to apply camera controller state to the actual camera transform.
fn apply_camera_to_transform(
    controller: Res<CameraController>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    for mut transform in camera_query.iter_mut() {
        *transform =
            Transform::from_translation(controller.position()).looking_at(controller.focus, Vec3::Y);
    }
}
