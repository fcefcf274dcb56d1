//! Test data generator for matching-graph benchmarks.
//!
//! Writes a planar grid detector error model with open left and right
//! boundaries, then samples syndromes from it by flipping each edge with its
//! error probability. Outputs the model (.dem) and the shots (.b8) consumed
//! by the `run` and `query` subcommands.

use anyhow::{Result, ensure};
use mgraph_io::{loader, parser};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

/// Generates a `size` x `size` grid model and sampled shots.
///
/// Detector `r * size + c` sits at row r, column c. Neighbouring detectors
/// in a row or column share an edge. Every detector in the first column has
/// an edge to the boundary that flips logical observable L0, and every
/// detector in the last column has a plain boundary edge, so a chain across
/// the grid is a logical error.
///
/// # Arguments
///
/// * `dem_path` - Output path for the detector error model (.dem file)
/// * `b8_path` - Output path for the syndrome data (.b8 file)
/// * `size` - Grid side length (creates size x size detectors)
/// * `num_shots` - Number of shots to sample
/// * `p` - Error probability of every edge
/// * `seed` - Seed for the shot sampler
pub fn generate_grid_data(
    dem_path: &str,
    b8_path: &str,
    size: usize,
    num_shots: usize,
    p: f64,
    seed: u64,
) -> Result<()> {
    ensure!(size >= 2, "grid size must be at least 2, got {}", size);
    ensure!(
        p > 0.0 && p <= 0.5,
        "edge probability must lie in (0, 0.5], got {}",
        p
    );

    info!(size, p, "generating grid detector error model");
    let mut dem_file = BufWriter::new(File::create(dem_path)?);
    writeln!(dem_file, "# {}x{} grid, p={}", size, size, p)?;

    for r in 0..size {
        for c in 0..size - 1 {
            let u = r * size + c;
            writeln!(dem_file, "error({}) D{} D{}", p, u, u + 1)?;
        }
    }
    for r in 0..size - 1 {
        for c in 0..size {
            let u = r * size + c;
            writeln!(dem_file, "error({}) D{} D{}", p, u, u + size)?;
        }
    }
    for r in 0..size {
        writeln!(dem_file, "error({}) D{} L0", p, r * size)?;
        writeln!(dem_file, "error({}) D{}", p, r * size + size - 1)?;
    }
    writeln!(dem_file, "logical_observable L0")?;
    dem_file.flush()?;
    drop(dem_file);

    let graph = parser::load_dem_file(dem_path)?;
    let num_detectors = size * size;

    info!(num_shots, seed, "sampling shots");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shots = Vec::with_capacity(num_shots);
    let mut logical_flips = 0usize;
    for _ in 0..num_shots {
        let sample = graph.add_noise(&mut rng)?;
        if sample.fault_flips.contains(&0) {
            logical_flips += 1;
        }
        shots.push(sample.syndrome);
    }

    loader::write_b8_file(b8_path, &shots, num_detectors)?;
    info!(
        dem = dem_path,
        b8 = b8_path,
        logical_flips,
        "wrote benchmark data"
    );
    Ok(())
}
