//! Integration tests for the visualization layer.

use bevy::prelude::*;
use flow_core::{FlowConfig, LedgerScene, LoopControl};
use viz::headless::HeadlessPopulation;
use viz::HeadlessPlugin;

fn run_headless(config: FlowConfig, frames: u64, report: std::path::PathBuf) -> serde_json::Value {
    let mut app = App::new();
    app.insert_resource(config).add_plugins(HeadlessPlugin {
        frames,
        report: Some(report.clone()),
    });

    for _ in 0..frames + 10 {
        app.update();
        if app.world().resource::<LoopControl>().is_stopped()
            && !app.world().resource::<Events<AppExit>>().is_empty()
        {
            break;
        }
    }

    serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap()
}

/// Test a fixture config drives the headless runner end to end.
#[test]
fn test_fixture_config_headless_run() {
    let config = FlowConfig::from_str(include_str!("fixtures/dense_flow.toml")).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let report = run_headless(config, 240, dir.path().join("report.json"));

    assert_eq!(report["frames"], 240);
    assert_eq!(report["flow_speed"], 6.0);
    assert_eq!(report["cell_count"], 250);
    assert_eq!(report["census"]["red"], 200);
    assert_eq!(report["census"]["white"], 25);
    assert_eq!(report["census"]["platelet"], 25);
    assert_eq!(report["visible"], 225);
    assert_eq!(report["out_of_bounds"], 0);
    assert_eq!(report["leaked"], 0);
}

/// Test seeded headless runs produce identical reports.
#[test]
fn test_seeded_headless_runs_match() {
    let mut config = FlowConfig::default();
    config.flow.seed = Some(99);
    let dir = tempfile::tempdir().unwrap();

    let first = run_headless(config.clone(), 300, dir.path().join("first.json"));
    let second = run_headless(config, 300, dir.path().join("second.json"));

    assert_eq!(first, second);
}

/// Test a zero-frame run exits immediately and still tears down.
#[test]
fn test_zero_frame_run() {
    let mut app = App::new();
    app.insert_resource(FlowConfig::default())
        .add_plugins(HeadlessPlugin {
            frames: 0,
            report: None,
        });
    app.update();

    assert_eq!(app.world().resource::<LoopControl>().frames(), 0);
    assert!(!app.world().resource::<Events<AppExit>>().is_empty());
    assert_eq!(app.world().resource::<LedgerScene>().live_count(), 0);
    assert!(app.world().resource::<HeadlessPopulation>().is_empty());
}
