//! Blood Flow Visualization
//!
//! Run with: cargo run -p viz
//!
//! Examples:
//!   cargo run -p viz -- --cell-count 300 --flow-speed 4
//!   cargo run -p viz -- --headless 600 --seed 42 --report report.json
//!   cargo run -p viz -- --print-config > flow.toml

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use flow_core::{ConfigError, FlowConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use viz::{FlowVizPlugin, HeadlessPlugin};

/// Blood Flow Visualization
#[derive(Parser, Debug)]
#[command(name = "blood_flow")]
#[command(about = "Red cells, white cells and platelets flowing through a vessel")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of cells to start with
    #[arg(long)]
    cell_count: Option<usize>,

    /// Flow speed multiplier
    #[arg(long)]
    flow_speed: Option<f32>,

    /// Random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Run without a window for this many frames, then exit
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u64>,

    /// Write a JSON summary of the headless run here
    #[arg(long, requires = "headless")]
    report: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Load the configuration file, apply CLI overrides, and validate.
fn load_config(args: &Args) -> Result<FlowConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => FlowConfig::from_file(path)?,
        None => FlowConfig::default(),
    };

    if let Some(count) = args.cell_count {
        config.flow.cell_count = count;
    }
    if let Some(speed) = args.flow_speed {
        config.flow.flow_speed = speed;
    }
    if args.seed.is_some() {
        config.flow.seed = args.seed;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.print_config {
        return match config.to_toml() {
            Ok(toml) => {
                print!("{}", toml);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut app = App::new();
    app.insert_resource(config);

    match args.headless {
        Some(frames) => app.add_plugins((
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
            LogPlugin::default(),
            HeadlessPlugin {
                frames,
                report: args.report,
            },
        )),
        None => app.add_plugins(FlowVizPlugin),
    };

    match app.run() {
        AppExit::Success => ExitCode::SUCCESS,
        AppExit::Error(code) => ExitCode::from(code.get()),
    }
}
