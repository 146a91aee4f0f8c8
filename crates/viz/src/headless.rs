//! Headless runner: drives the population without a window.
//!
//! Cells live in a [`LedgerScene`] instead of the Bevy world, the clock is
//! synthetic (60 frames per second), and the run stops after a fixed number
//! of frames. A JSON summary can be written on exit.

use bevy::prelude::*;
use flow_core::{Census, FlowConfig, LedgerHandle, LedgerScene, LoopControl, Population};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::plugin::simulation_should_step;

/// Synthetic frames per second.
const FRAME_RATE: f64 = 60.0;
/// Frames between progress log lines.
const LOG_INTERVAL: u64 = 60;

/// Plugin running the simulation for a fixed number of frames.
pub struct HeadlessPlugin {
    pub frames: u64,
    /// Where to write the JSON report, if anywhere.
    pub report: Option<PathBuf>,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<FlowConfig>() {
            app.init_resource::<FlowConfig>();
        }

        app.insert_resource(LoopControl::with_frame_limit(self.frames))
            .insert_resource(HeadlessRun {
                report: self.report.clone(),
                out_of_bounds: 0,
                finished: false,
            })
            .init_resource::<LedgerScene>()
            .add_systems(Startup, setup_headless_population)
            .add_systems(Update, step_headless.run_if(simulation_should_step))
            .add_systems(Last, finish_headless);
    }
}

/// The population driven by the headless runner.
#[derive(Resource, Deref, DerefMut)]
pub struct HeadlessPopulation(pub Population<LedgerHandle>);

/// Bookkeeping for one headless run.
#[derive(Resource, Debug)]
pub struct HeadlessRun {
    report: Option<PathBuf>,
    /// Cell-frames observed outside the live range.
    out_of_bounds: u64,
    finished: bool,
}

/// Summary of a headless run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessReport {
    pub frames: u64,
    pub flow_speed: f32,
    pub cell_count: usize,
    pub census: Census,
    pub visible: usize,
    pub recycled: u64,
    pub out_of_bounds: u64,
    /// Renderables spawned over the whole run.
    pub spawned: u64,
    /// Renderables released over the whole run, including the final teardown.
    pub released: u64,
    /// Renderables left in the scene after teardown.
    pub leaked: usize,
}

/// Write a report as pretty-printed JSON.
pub fn write_report(path: &Path, report: &HeadlessReport) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to serialize report: {}", e))?;
    std::fs::write(path, json)
        .map_err(|e| format!("Failed to write report {:?}: {}", path, e))
}

fn setup_headless_population(
    mut commands: Commands,
    config: Res<FlowConfig>,
    mut scene: ResMut<LedgerScene>,
) {
    let mut population = Population::new(&config);
    population.rebuild(&mut *scene);
    tracing::info!(
        "Headless run: {} cells at flow speed {}",
        population.len(),
        population.flow_speed()
    );
    commands.insert_resource(HeadlessPopulation(population));
}

fn step_headless(
    mut population: ResMut<HeadlessPopulation>,
    mut scene: ResMut<LedgerScene>,
    mut control: ResMut<LoopControl>,
    mut run: ResMut<HeadlessRun>,
) {
    let time = control.frames() as f64 / FRAME_RATE;
    population.tick(&mut *scene, time);
    control.record_frame();

    let vessel = *population.vessel();
    let escaped = population
        .cells()
        .iter()
        .filter(|cell| !vessel.contains_z(cell.state.position.z))
        .count();
    if escaped > 0 {
        tracing::warn!("{} cells outside the vessel range", escaped);
        run.out_of_bounds += escaped as u64;
    }

    let frames = control.frames();
    if frames % LOG_INTERVAL == 0 {
        tracing::info!(
            "Frame {}: {} cells, {} recycled",
            frames,
            population.len(),
            population.recycled()
        );
    }
}

fn finish_headless(
    mut population: Option<ResMut<HeadlessPopulation>>,
    mut scene: ResMut<LedgerScene>,
    control: Res<LoopControl>,
    mut run: ResMut<HeadlessRun>,
    mut exit: EventWriter<AppExit>,
) {
    if run.finished || !control.is_stopped() {
        return;
    }
    let Some(population) = population.as_mut() else {
        return;
    };
    run.finished = true;

    let census = population.census();
    let visible = population.visible_count();
    let recycled = population.recycled();
    population.release_all(&mut *scene);

    let report = HeadlessReport {
        frames: control.frames(),
        flow_speed: population.flow_speed(),
        cell_count: census.total(),
        census,
        visible,
        recycled,
        out_of_bounds: run.out_of_bounds,
        spawned: scene.spawned(),
        released: scene.released(),
        leaked: scene.live_count(),
    };
    tracing::info!(
        "Headless run finished: {} frames, {} recycled, {} leaked",
        report.frames,
        report.recycled,
        report.leaked
    );

    let status = match run.report.as_deref() {
        Some(path) => match write_report(path, &report) {
            Ok(()) => {
                tracing::info!("Report written to {:?}", path);
                AppExit::Success
            }
            Err(e) => {
                tracing::error!("{}", e);
                AppExit::error()
            }
        },
        None => AppExit::Success,
    };
    exit.send(status);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless_app(frames: u64, report: Option<PathBuf>) -> App {
        let mut config = FlowConfig::default();
        config.flow.seed = Some(3);
        config.flow.flow_speed = 10.0;

        let mut app = App::new();
        app.insert_resource(config)
            .add_plugins(HeadlessPlugin { frames, report });
        app
    }

    fn run_to_exit(app: &mut App, max_updates: usize) -> usize {
        for update in 1..=max_updates {
            app.update();
            if !app.world().resource::<Events<AppExit>>().is_empty() {
                return update;
            }
        }
        panic!("headless run did not exit");
    }

    #[test]
    fn test_stops_after_frame_limit() {
        let mut app = headless_app(90, None);
        let updates = run_to_exit(&mut app, 200);

        assert_eq!(updates, 90);
        let control = app.world().resource::<LoopControl>();
        assert!(control.is_stopped());
        assert_eq!(control.frames(), 90);
    }

    #[test]
    fn test_teardown_releases_everything() {
        let mut app = headless_app(30, None);
        run_to_exit(&mut app, 100);

        let scene = app.world().resource::<LedgerScene>();
        assert_eq!(scene.live_count(), 0);
        assert_eq!(scene.spawned(), 120);
        assert_eq!(scene.released(), 120);
        assert!(app.world().resource::<HeadlessPopulation>().is_empty());
    }

    #[test]
    fn test_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut app = headless_app(600, Some(path.clone()));
        run_to_exit(&mut app, 700);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["frames"], 600);
        assert_eq!(json["cell_count"], 120);
        assert_eq!(json["census"]["red"], 96);
        assert_eq!(json["out_of_bounds"], 0);
        assert_eq!(json["leaked"], 0);
        assert!(json["recycled"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_unwritable_report_exits_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");

        let mut app = headless_app(5, Some(path));
        run_to_exit(&mut app, 20);

        let events = app.world().resource::<Events<AppExit>>();
        let mut reader = events.get_reader();
        let exit = reader.read(events).next().cloned();
        assert!(matches!(exit, Some(AppExit::Error(_))));
    }
}
