//! Cell rendering: the Bevy side of the population's scene.

use bevy::prelude::*;
use flow_core::{blueprint, Category, FlowConfig, LoopControl, Population, Pose, Scene};

use crate::plugin::{simulation_should_step, FlowSet};

/// Sphere resolution of a cell body.
const BODY_RESOLUTION: usize = 16;
/// Sphere resolution of a white cell bump.
const BUMP_RESOLUTION: usize = 18;
/// Sphere resolution of a platelet granule.
const GRANULE_RESOLUTION: usize = 8;

/// Plugin spawning and animating the cells.
pub struct CellPlugin;

impl Plugin for CellPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<LoopControl>() {
            app.init_resource::<LoopControl>();
        }

        app.add_systems(Startup, setup_population)
            .add_systems(
                Update,
                tick_population
                    .in_set(FlowSet::Simulate)
                    .run_if(simulation_should_step),
            )
            .add_systems(Last, release_on_stop);
    }
}

/// Root of one cell's entity hierarchy.
#[derive(Component, Debug, Clone, Copy)]
pub struct FlowCell {
    pub category: Category,
}

/// Everything one cell owns in the Bevy world.
#[derive(Debug)]
pub struct CellRenderable {
    pub root: Entity,
    pub meshes: Vec<Handle<Mesh>>,
    pub materials: Vec<Handle<StandardMaterial>>,
}

/// The live population, owning one [`CellRenderable`] per cell.
#[derive(Resource, Deref, DerefMut)]
pub struct CellPopulation(pub Population<CellRenderable>);

/// Scene backed by Bevy commands and asset stores.
pub struct BevyScene<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    meshes: &'a mut Assets<Mesh>,
    materials: &'a mut Assets<StandardMaterial>,
}

impl<'a, 'w, 's> BevyScene<'a, 'w, 's> {
    pub fn new(
        commands: &'a mut Commands<'w, 's>,
        meshes: &'a mut Assets<Mesh>,
        materials: &'a mut Assets<StandardMaterial>,
    ) -> Self {
        Self {
            commands,
            meshes,
            materials,
        }
    }
}

impl Scene for BevyScene<'_, '_, '_> {
    type Handle = CellRenderable;

    fn spawn(&mut self, category: Category, pose: Pose) -> CellRenderable {
        let shape = blueprint(category);
        let mut meshes = Vec::with_capacity(shape.parts.len() + 1);
        let mut materials = Vec::with_capacity(shape.parts.len() + 1);

        let body_mesh = self
            .meshes
            .add(Sphere::new(1.0).mesh().uv(BODY_RESOLUTION, BODY_RESOLUTION));
        let body_material = self.materials.add(cell_material(shape.color, shape.shininess));
        meshes.push(body_mesh.clone());
        materials.push(body_material.clone());

        let resolution = match category {
            Category::Platelet => GRANULE_RESOLUTION,
            _ => BUMP_RESOLUTION,
        };
        let mut parts = Vec::with_capacity(shape.parts.len());
        for part in &shape.parts {
            let mesh = self
                .meshes
                .add(Sphere::new(part.radius).mesh().uv(resolution, resolution));
            let material = self.materials.add(cell_material(part.color, part.shininess));
            meshes.push(mesh.clone());
            materials.push(material.clone());
            parts.push((mesh, material, part.offset));
        }

        let root = self
            .commands
            .spawn((
                SpatialBundle::from_transform(pose_transform(&pose)),
                FlowCell { category },
            ))
            .with_children(|parent| {
                parent.spawn(PbrBundle {
                    mesh: body_mesh,
                    material: body_material,
                    transform: Transform::from_scale(Vec3::new(1.0, shape.flattening, 1.0)),
                    ..default()
                });
                for (mesh, material, offset) in parts {
                    parent.spawn(PbrBundle {
                        mesh,
                        material,
                        transform: Transform::from_translation(offset),
                        ..default()
                    });
                }
            })
            .id();

        CellRenderable {
            root,
            meshes,
            materials,
        }
    }

    fn release(&mut self, handle: CellRenderable) {
        if let Some(entity) = self.commands.get_entity(handle.root) {
            entity.despawn_recursive();
        }
        for mesh in &handle.meshes {
            self.meshes.remove(mesh);
        }
        for material in &handle.materials {
            self.materials.remove(material);
        }
    }

    fn place(&mut self, handle: &CellRenderable, pose: Pose) {
        if let Some(mut entity) = self.commands.get_entity(handle.root) {
            entity.insert(pose_transform(&pose));
        }
    }

    fn set_visible(&mut self, handle: &CellRenderable, visible: bool) {
        if let Some(mut entity) = self.commands.get_entity(handle.root) {
            entity.insert(if visible {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            });
        }
    }
}

/// Convert a 0xRRGGBB colour.
pub fn hex_color(hex: u32) -> Color {
    Color::srgb_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// Map a 0-100 shininess onto PBR roughness.
pub fn roughness_from_shininess(shininess: f32) -> f32 {
    (1.0 - shininess / 100.0).clamp(0.089, 1.0)
}

/// Transform for a cell root: Euler XYZ rotation and uniform scale.
pub fn pose_transform(pose: &Pose) -> Transform {
    let r = pose.rotation;
    Transform {
        translation: pose.position,
        rotation: Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
        scale: Vec3::splat(pose.scale),
    }
}

fn cell_material(color: u32, shininess: f32) -> StandardMaterial {
    StandardMaterial {
        base_color: hex_color(color),
        perceptual_roughness: roughness_from_shininess(shininess),
        ..default()
    }
}

fn setup_population(
    mut commands: Commands,
    config: Res<FlowConfig>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut population = Population::new(&config);
    let mut scene = BevyScene::new(&mut commands, &mut meshes, &mut materials);
    population.rebuild(&mut scene);
    commands.insert_resource(CellPopulation(population));
}

fn tick_population(
    mut commands: Commands,
    mut population: ResMut<CellPopulation>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut control: ResMut<LoopControl>,
    time: Res<Time>,
) {
    let mut scene = BevyScene::new(&mut commands, &mut meshes, &mut materials);
    population.tick(&mut scene, time.elapsed_seconds_f64());
    control.record_frame();
}

fn release_on_stop(
    mut commands: Commands,
    control: Res<LoopControl>,
    population: Option<ResMut<CellPopulation>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(mut population) = population else {
        return;
    };
    if !control.is_stopped() || population.is_empty() {
        return;
    }

    let mut scene = BevyScene::new(&mut commands, &mut meshes, &mut materials);
    population.release_all(&mut scene);
    tracing::info!(
        "Loop stopped after {} frames, cells released",
        control.frames()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn test_app(cell_count: usize) -> App {
        let mut config = FlowConfig::default();
        config.flow.seed = Some(7);
        config.flow.cell_count = cell_count;

        let mut app = App::new();
        app.insert_resource(config)
            .init_resource::<Time>()
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .add_plugins(CellPlugin);
        app
    }

    fn root_translations(app: &mut App) -> Vec<Vec3> {
        let mut roots = app
            .world_mut()
            .query_filtered::<(Entity, &Transform), With<FlowCell>>();
        let mut translations: Vec<(Entity, Vec3)> = roots
            .iter(app.world())
            .map(|(entity, transform)| (entity, transform.translation))
            .collect();
        translations.sort_by_key(|(entity, _)| *entity);
        translations.into_iter().map(|(_, t)| t).collect()
    }

    fn asset_app() -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>();
        app
    }

    fn spawn_white_cell(
        mut commands: Commands,
        mut meshes: ResMut<Assets<Mesh>>,
        mut materials: ResMut<Assets<StandardMaterial>>,
    ) -> CellRenderable {
        let mut scene = BevyScene::new(&mut commands, &mut meshes, &mut materials);
        let pose = Pose {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 7.0,
        };
        scene.spawn(Category::White, pose)
    }

    fn release_cell(
        In(handle): In<CellRenderable>,
        mut commands: Commands,
        mut meshes: ResMut<Assets<Mesh>>,
        mut materials: ResMut<Assets<StandardMaterial>>,
    ) {
        let mut scene = BevyScene::new(&mut commands, &mut meshes, &mut materials);
        scene.release(handle);
    }

    fn duplicate(handle: &CellRenderable) -> CellRenderable {
        CellRenderable {
            root: handle.root,
            meshes: handle.meshes.clone(),
            materials: handle.materials.clone(),
        }
    }

    fn entity_count(app: &mut App) -> usize {
        let mut entities = app.world_mut().query::<Entity>();
        entities.iter(app.world()).count()
    }

    #[test]
    fn test_release_twice_is_harmless() {
        let mut app = asset_app();
        let baseline = entity_count(&mut app);
        let handle = app.world_mut().run_system_once(spawn_white_cell);
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 16);
        assert_eq!(entity_count(&mut app), baseline + 17);

        let twin = duplicate(&handle);
        app.world_mut().run_system_once_with(handle, release_cell);
        app.world_mut().run_system_once_with(twin, release_cell);

        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 0);
        assert_eq!(entity_count(&mut app), baseline);
    }

    #[test]
    fn test_release_after_parts_are_gone() {
        let mut app = asset_app();
        let baseline = entity_count(&mut app);
        let handle = app.world_mut().run_system_once(spawn_white_cell);

        app.world_mut().entity_mut(handle.root).despawn_recursive();
        app.world_mut()
            .resource_mut::<Assets<Mesh>>()
            .remove(&handle.meshes[0]);
        app.world_mut()
            .resource_mut::<Assets<StandardMaterial>>()
            .remove(&handle.materials[3]);
        assert_eq!(entity_count(&mut app), baseline);

        app.world_mut().run_system_once_with(handle, release_cell);

        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 0);
        assert_eq!(entity_count(&mut app), baseline);
    }

    #[test]
    fn test_hex_color() {
        let color = hex_color(0xe74c3c).to_srgba();
        assert!((color.red - 0xe7 as f32 / 255.0).abs() < 1e-3);
        assert!((color.green - 0x4c as f32 / 255.0).abs() < 1e-3);
        assert!((color.blue - 0x3c as f32 / 255.0).abs() < 1e-3);
    }

    #[test]
    fn test_roughness_from_shininess() {
        assert!((roughness_from_shininess(50.0) - 0.5).abs() < 1e-6);
        assert!(roughness_from_shininess(35.0) > roughness_from_shininess(50.0));
        assert_eq!(roughness_from_shininess(100.0), 0.089);
    }

    #[test]
    fn test_pose_transform_scales_uniformly() {
        let pose = Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::ZERO,
            scale: 4.5,
        };
        let transform = pose_transform(&pose);

        assert_eq!(transform.translation, pose.position);
        assert_eq!(transform.scale, Vec3::splat(4.5));
        assert_eq!(transform.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_startup_spawns_every_part() {
        let mut app = test_app(120);
        app.update();

        // 96 red bodies, 12 white cells of 16 spheres, 12 platelets of 6
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 360);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 360);

        let mut roots = app.world_mut().query::<&FlowCell>();
        let roots = roots.iter(app.world()).count();
        assert_eq!(roots, 120);
        assert_eq!(app.world().resource::<CellPopulation>().len(), 120);
    }

    #[test]
    fn test_tick_moves_cells_and_counts_frames() {
        let mut app = test_app(20);
        app.update();
        let before = root_translations(&mut app);

        app.update();
        let after = root_translations(&mut app);

        assert_eq!(before.len(), after.len());
        assert_ne!(before, after);
        assert_eq!(app.world().resource::<LoopControl>().frames(), 2);
    }

    #[test]
    fn test_paused_loop_freezes_cells() {
        let mut app = test_app(20);
        app.update();
        app.world_mut().resource_mut::<LoopControl>().toggle_pause();
        app.update();
        app.update();

        assert_eq!(app.world().resource::<LoopControl>().frames(), 1);
    }

    #[test]
    fn test_stop_releases_all_assets() {
        let mut app = test_app(120);
        app.update();
        app.world_mut().resource_mut::<LoopControl>().stop();
        app.update();

        assert!(app.world().resource::<CellPopulation>().is_empty());
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 0);
        let mut roots = app.world_mut().query::<&FlowCell>();
        let roots = roots.iter(app.world()).count();
        assert_eq!(roots, 0);
    }
}
