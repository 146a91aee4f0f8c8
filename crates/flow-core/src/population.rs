//! Population management: the fixed-size pool of cells and their renderables.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::category::{Category, CategoryVisibility};
use crate::cell::CellState;
use crate::config::{FlowConfig, FlowSettings};
use crate::scene::Scene;
use crate::vessel::Vessel;

/// Per-category cell counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    pub red: usize,
    pub white: usize,
    pub platelet: usize,
}

impl Census {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Red => self.red,
            Category::White => self.white,
            Category::Platelet => self.platelet,
        }
    }

    fn bump(&mut self, category: Category) {
        match category {
            Category::Red => self.red += 1,
            Category::White => self.white += 1,
            Category::Platelet => self.platelet += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.red + self.white + self.platelet
    }
}

/// Split a population of `total` cells 80/10/10, remainder to platelets.
pub fn split_counts(total: usize) -> Census {
    let red = total * 4 / 5;
    let white = total / 10;
    Census {
        red,
        white,
        platelet: total - red - white,
    }
}

/// One live cell: kinematic state plus the renderable it drives.
#[derive(Debug)]
pub struct Cell<H> {
    pub state: CellState,
    renderable: H,
}

impl<H> Cell<H> {
    pub fn category(&self) -> Category {
        self.state.category()
    }

    pub fn renderable(&self) -> &H {
        &self.renderable
    }
}

/// Owns every live cell and the knobs that drive them.
///
/// `H` is the renderable handle type of the [`Scene`] the population draws
/// into. The population never holds a scene itself; every operation that
/// touches renderables borrows one.
pub struct Population<H> {
    vessel: Vessel,
    settings: FlowSettings,
    flow_speed: f32,
    target_count: usize,
    visibility: CategoryVisibility,
    /// Visibility restored by [`Population::restore_defaults`].
    default_visibility: CategoryVisibility,
    cells: Vec<Cell<H>>,
    rng: SmallRng,
    /// Clock value of the most recent tick, in seconds.
    last_time: f64,
    recycled: u64,
    rebuilds: u64,
}

impl<H> Population<H> {
    /// Create an empty population from configuration.
    ///
    /// Call [`Population::rebuild`] to fill it.
    pub fn new(config: &FlowConfig) -> Self {
        let rng = match config.flow.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Create an empty population drawing from the given RNG.
    pub fn with_rng(config: &FlowConfig, rng: SmallRng) -> Self {
        Self {
            vessel: config.vessel.vessel(),
            settings: config.flow.clone(),
            flow_speed: config.flow.flow_speed,
            target_count: config.flow.cell_count,
            visibility: config.visibility,
            default_visibility: config.visibility,
            cells: Vec::new(),
            rng,
            last_time: 0.0,
            recycled: 0,
            rebuilds: 0,
        }
    }

    pub fn vessel(&self) -> &Vessel {
        &self.vessel
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    pub fn flow_speed(&self) -> f32 {
        self.flow_speed
    }

    /// Cell count the next rebuild will produce.
    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn visibility(&self) -> CategoryVisibility {
        self.visibility
    }

    /// Live cells in population order.
    pub fn cells(&self) -> &[Cell<H>] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Count live cells per category.
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for cell in &self.cells {
            census.bump(cell.category());
        }
        census
    }

    /// Number of live cells whose category is currently shown.
    pub fn visible_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| self.visibility.get(cell.category()))
            .count()
    }

    /// Cells sent back to the start since the last rebuild.
    pub fn recycled(&self) -> u64 {
        self.recycled
    }

    /// Number of rebuilds performed.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Set the flow speed multiplier, clamped to the configured range.
    pub fn set_flow_speed(&mut self, speed: f32) -> f32 {
        let clamped = self.settings.clamp_flow_speed(speed);
        if clamped != speed {
            tracing::debug!("Flow speed {} clamped to {}", speed, clamped);
        }
        self.flow_speed = clamped;
        clamped
    }

    /// Set the cell count used by the next rebuild, clamped to the configured range.
    pub fn set_target_count(&mut self, count: usize) -> usize {
        let clamped = self.settings.clamp_cell_count(count);
        if clamped != count {
            tracing::debug!("Cell count {} clamped to {}", count, clamped);
        }
        self.target_count = clamped;
        clamped
    }

    /// Show or hide every cell of one category.
    pub fn set_category_visibility<S>(&mut self, category: Category, visible: bool, scene: &mut S)
    where
        S: Scene<Handle = H>,
    {
        self.visibility.set(category, visible);
        for cell in self.cells.iter().filter(|c| c.category() == category) {
            scene.set_visible(&cell.renderable, visible);
        }
        tracing::debug!("{} visible: {}", category, visible);
    }

    /// Replace every cell with a fresh population of the target size.
    ///
    /// Old renderables are released before any new one is spawned. New cells
    /// are scattered along the whole tube so the first frame is not a
    /// wavefront at the entrance.
    pub fn rebuild<S>(&mut self, scene: &mut S)
    where
        S: Scene<Handle = H>,
    {
        self.release_all(scene);

        let counts = split_counts(self.target_count);
        self.cells.reserve(counts.total());

        let entrance = self.vessel.entrance_z();
        let exit = self.vessel.exit_z();
        for category in Category::ALL {
            for _ in 0..counts.get(category) {
                let mut state =
                    CellState::spawn(category, &mut self.rng, &self.vessel, self.flow_speed);
                state.position.z = self.rng.gen_range(entrance..=exit);
                let renderable = scene.spawn(category, state.pose(self.last_time));
                self.cells.push(Cell { state, renderable });
            }
        }

        self.apply_visibility(scene);
        self.recycled = 0;
        self.rebuilds += 1;

        tracing::info!(
            "Rebuilt population: {} cells ({} red, {} white, {} platelets)",
            counts.total(),
            counts.red,
            counts.white,
            counts.platelet
        );
    }

    /// Restore the configured flow speed, cell count and visibility, then rebuild.
    pub fn restore_defaults<S>(&mut self, scene: &mut S)
    where
        S: Scene<Handle = H>,
    {
        self.flow_speed = self.settings.flow_speed;
        self.target_count = self.settings.cell_count;
        self.visibility = self.default_visibility;
        tracing::info!(
            "Restored defaults: flow speed {}, {} cells",
            self.flow_speed,
            self.target_count
        );
        self.rebuild(scene);
    }

    /// Advance every cell one frame and write their poses to the scene.
    ///
    /// `time` is the clock in seconds and only drives the wobble.
    pub fn tick<S>(&mut self, scene: &mut S, time: f64)
    where
        S: Scene<Handle = H>,
    {
        self.last_time = time;
        for cell in &mut self.cells {
            let step = cell
                .state
                .advance(self.flow_speed, time, &self.vessel, &mut self.rng);
            scene.place(&cell.renderable, step.pose);
            if step.recycled {
                self.recycled += 1;
            }
        }
    }

    /// Release every renderable and empty the population.
    pub fn release_all<S>(&mut self, scene: &mut S)
    where
        S: Scene<Handle = H>,
    {
        for cell in self.cells.drain(..) {
            scene.release(cell.renderable);
        }
    }

    fn apply_visibility<S>(&self, scene: &mut S)
    where
        S: Scene<Handle = H>,
    {
        for cell in &self.cells {
            scene.set_visible(&cell.renderable, self.visibility.get(cell.category()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::LedgerScene;

    fn seeded(config: &FlowConfig) -> Population<crate::scene::LedgerHandle> {
        Population::with_rng(config, SmallRng::seed_from_u64(42))
    }

    #[test]
    fn test_split_counts() {
        assert_eq!(
            split_counts(120),
            Census {
                red: 96,
                white: 12,
                platelet: 12
            }
        );
        assert_eq!(
            split_counts(15),
            Census {
                red: 12,
                white: 1,
                platelet: 2
            }
        );
        assert_eq!(split_counts(0).total(), 0);
        for n in 10..=500 {
            let census = split_counts(n);
            assert_eq!(census.total(), n);
            assert_eq!(census.red, (n as f64 * 0.8).floor() as usize);
            assert_eq!(census.white, (n as f64 * 0.1).floor() as usize);
        }
    }

    #[test]
    fn test_new_population_is_empty() {
        let population = seeded(&FlowConfig::default());
        assert!(population.is_empty());
        assert_eq!(population.target_count(), 120);
        assert_eq!(population.flow_speed(), 2.0);
    }

    #[test]
    fn test_setters_clamp() {
        let mut population = seeded(&FlowConfig::default());
        assert_eq!(population.set_flow_speed(0.0), 0.1);
        assert_eq!(population.set_flow_speed(4.5), 4.5);
        assert_eq!(population.set_target_count(5000), 500);
        assert_eq!(population.target_count(), 500);
    }

    #[test]
    fn test_rebuild_scatters_along_tube() {
        let mut scene = LedgerScene::new();
        let mut population = seeded(&FlowConfig::default());
        population.rebuild(&mut scene);

        let vessel = *population.vessel();
        for cell in population.cells() {
            let z = cell.state.position.z;
            assert!(z >= vessel.entrance_z() && z <= vessel.exit_z());
        }
        assert_eq!(population.rebuilds(), 1);
    }

    #[test]
    fn test_tick_places_every_renderable() {
        let mut scene = LedgerScene::new();
        let mut population = seeded(&FlowConfig::default());
        population.rebuild(&mut scene);
        let before = scene.placements();

        population.tick(&mut scene, 1.0);

        assert_eq!(scene.placements() - before, 120);
        for cell in population.cells() {
            let entry = scene.get(cell.renderable().id()).unwrap();
            assert_eq!(entry.pose.rotation, cell.state.orientation);
        }
    }
}
