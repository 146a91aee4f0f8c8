//! Determinism verification tests
//!
//! Tests to ensure a seeded population produces identical motion.

use flow_core::{FlowConfig, LedgerHandle, LedgerScene, Population};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn run(seed: u64, frames: u32) -> Vec<[f32; 3]> {
    let mut config = FlowConfig::default();
    config.flow.seed = Some(seed);

    let mut scene = LedgerScene::new();
    let mut population: Population<LedgerHandle> = Population::new(&config);
    population.rebuild(&mut scene);
    population.set_flow_speed(6.0);

    for frame in 0..frames {
        population.tick(&mut scene, f64::from(frame) / 60.0);
    }

    population
        .cells()
        .iter()
        .map(|cell| cell.state.position.to_array())
        .collect()
}

/// Test that SmallRng produces identical sequences with the same seed
#[test]
fn test_rng_determinism() {
    let seed = 42u64;

    let mut rng1 = SmallRng::seed_from_u64(seed);
    let values1: Vec<f32> = (0..100).map(|_| rng1.gen()).collect();

    let mut rng2 = SmallRng::seed_from_u64(seed);
    let values2: Vec<f32> = (0..100).map(|_| rng2.gen()).collect();

    assert_eq!(values1, values2, "RNG sequences should be identical with same seed");
}

/// Test that a seeded population replays exactly, including recycling
#[test]
fn test_population_determinism() {
    let first = run(42, 300);
    let second = run(42, 300);

    assert_eq!(first.len(), 120);
    assert_eq!(first, second, "Seeded runs should produce identical positions");
}

/// Test that different seeds produce different populations
#[test]
fn test_population_different_seeds() {
    assert_ne!(
        run(42, 10),
        run(43, 10),
        "Different seeds should produce different positions"
    );
}
