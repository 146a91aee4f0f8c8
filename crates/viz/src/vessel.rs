//! The translucent tube the cells flow through.

use bevy::prelude::*;
use bevy::render::mesh::Indices;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::PrimitiveTopology;
use flow_core::{FlowConfig, Vessel};

/// Radial segments for both the wall mesh and its wireframe.
pub const WALL_SEGMENTS: u32 = 32;

const WALL_COLOR: Color = Color::srgba(0.827, 0.329, 0.0, 0.2);
const WIRE_COLOR: Color = Color::srgba(0.827, 0.329, 0.0, 0.1);

/// Plugin drawing the vessel.
pub struct VesselPlugin;

impl Plugin for VesselPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_vessel)
            .add_systems(Update, draw_vessel_wireframe);
    }
}

/// Build an open cylinder along Z, centred on the origin.
///
/// The seam column is duplicated so UVs wrap cleanly.
pub fn open_tube_mesh(radius: f32, length: f32, segments: u32) -> Mesh {
    let segments = segments.max(3);
    let half = length / 2.0;
    let columns = segments + 1;

    let mut positions = Vec::with_capacity(2 * columns as usize);
    let mut normals = Vec::with_capacity(2 * columns as usize);
    let mut uvs = Vec::with_capacity(2 * columns as usize);

    for (row, z) in [-half, half].into_iter().enumerate() {
        for i in 0..columns {
            let u = i as f32 / segments as f32;
            let angle = u * std::f32::consts::TAU;
            let (sin, cos) = angle.sin_cos();
            positions.push([radius * cos, radius * sin, z]);
            normals.push([cos, sin, 0.0]);
            uvs.push([u, row as f32]);
        }
    }

    let mut indices = Vec::with_capacity(6 * segments as usize);
    for i in 0..segments {
        let a = i;
        let b = i + 1;
        let c = columns + i;
        let d = columns + i + 1;
        indices.extend_from_slice(&[a, c, b, b, c, d]);
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

/// Straight wall lines of the wireframe, one per radial segment.
pub fn wall_lines(vessel: &Vessel, segments: u32) -> Vec<(Vec3, Vec3)> {
    (0..segments)
        .map(|i| {
            let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
            let (sin, cos) = angle.sin_cos();
            let x = vessel.radius * cos;
            let y = vessel.radius * sin;
            (
                Vec3::new(x, y, vessel.entrance_z()),
                Vec3::new(x, y, vessel.exit_z()),
            )
        })
        .collect()
}

fn spawn_vessel(
    mut commands: Commands,
    config: Res<FlowConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let vessel = config.vessel.vessel();

    commands.spawn(PbrBundle {
        mesh: meshes.add(open_tube_mesh(vessel.radius, vessel.length, WALL_SEGMENTS)),
        material: materials.add(StandardMaterial {
            base_color: WALL_COLOR,
            alpha_mode: AlphaMode::Blend,
            double_sided: true,
            cull_mode: None,
            ..default()
        }),
        ..default()
    });

    tracing::info!(
        "Vessel: length {}, radius {}",
        vessel.length,
        vessel.radius
    );
}

fn draw_vessel_wireframe(config: Res<FlowConfig>, mut gizmos: Gizmos) {
    let vessel = config.vessel.vessel();

    for z in [vessel.entrance_z(), vessel.exit_z()] {
        gizmos.circle(Vec3::new(0.0, 0.0, z), Dir3::Z, vessel.radius, WIRE_COLOR);
    }
    for (start, end) in wall_lines(&vessel, WALL_SEGMENTS) {
        gizmos.line(start, end, WIRE_COLOR);
    }
}
