use crate::stats::LatencyStats;
use anyhow::Result;
use mgraph_core::{
    FaultSet, GraphError, MatchingGraph, MatchingOracle, NodeId, ShortestPathConfig,
};
use mgraph_io::{loader, parser};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, warn};

/// Per-worker totals reduced across the rayon pool.
#[derive(Default)]
struct Tally {
    latency: LatencyStats,
    queries: usize,
    answered: usize,
    failed: usize,
    flagged_faults: usize,
}

impl Tally {
    fn merge(mut self, other: Self) -> Self {
        self.latency = self.latency.merge(other.latency);
        self.queries += other.queries;
        self.answered += other.answered;
        self.failed += other.failed;
        self.flagged_faults += other.flagged_faults;
        self
    }
}

/// Issues the queries a matching solver would make for one shot.
///
/// Builds the pairwise distance matrix of the triggered detectors, then
/// pairs each detector with its nearest partner (another detector or a
/// boundary node) and collects the fault identifiers on that path. Returns
/// the number of queries issued and the implied fault set.
fn query_shot(
    graph: &MatchingGraph,
    boundary: &[NodeId],
    shot: &[NodeId],
) -> Result<(usize, FaultSet), GraphError> {
    let k = shot.len();
    let matrix = graph.distance_matrix(shot)?;
    let mut queries = k * k.saturating_sub(1) / 2;
    let mut faults = FaultSet::new();

    for (i, &node) in shot.iter().enumerate() {
        let mut best: Option<(f64, NodeId)> = None;
        let mut consider = |d: f64, partner: NodeId| {
            if best.is_none_or(|(best_d, _)| d < best_d) {
                best = Some((d, partner));
            }
        };
        for (j, &other) in shot.iter().enumerate() {
            if j != i {
                consider(matrix[i * k + j], other);
            }
        }
        for &b in boundary {
            consider(graph.distance(node, b)?, b);
        }
        queries += boundary.len();

        match best {
            Some((d, partner)) if d.is_finite() => {
                faults.extend(graph.fault_ids(node, partner)?);
                queries += 1;
            }
            Some((_, partner)) => return Err(GraphError::NoPath { from: node, to: partner }),
            None => return Err(GraphError::NoPath { from: node, to: node }),
        }
    }
    Ok((queries, faults))
}

pub fn run_benchmark(
    dem_path: &str,
    b8_path: &str,
    user_detectors: Option<usize>,
    config: ShortestPathConfig,
) -> Result<()> {
    info!("Loading graph from {}", dem_path);
    let mut graph = parser::load_dem_file(dem_path)?;
    graph.set_config(config);

    let start_pre = Instant::now();
    graph.compute_all_pairs_shortest_paths();
    info!(
        elapsed = ?start_pre.elapsed(),
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        components = graph.num_connected_components(),
        "all-pairs shortest paths computed"
    );

    let boundary = graph.boundary();
    let num_detectors = user_detectors.unwrap_or(graph.num_nodes() - boundary.len());

    info!("Loading shots from {}", b8_path);
    let raw_bits = loader::load_b8_file(b8_path)?;
    let shots = loader::slice_shots(&raw_bits, num_detectors);
    info!("Loaded {} shots", shots.len());

    let start_bench = Instant::now();
    let tally = shots
        .par_iter()
        .fold(Tally::default, |mut tally, shot| {
            let start = Instant::now();
            match query_shot(&graph, &boundary, shot) {
                Ok((queries, faults)) => {
                    tally.queries += queries;
                    tally.answered += 1;
                    tally.flagged_faults += faults.len();
                }
                Err(e) => {
                    warn!(error = %e, "shot could not be answered");
                    tally.failed += 1;
                }
            }
            tally.latency.update(start.elapsed().as_nanos() as u64);
            tally
        })
        .reduce(Tally::default, Tally::merge);

    let seconds = start_bench.elapsed().as_secs_f64();

    println!("Results");
    println!("Time:        {:.4} s", seconds);
    println!("Throughput:  {:.2} shots/s", shots.len() as f64 / seconds);
    println!("Queries:     {:.2} queries/s", tally.queries as f64 / seconds);
    println!("Answered:    {}/{}", tally.answered, shots.len());
    println!("Unanswered:  {}", tally.failed);
    println!("Fault ids:   {} flagged in total", tally.flagged_faults);
    tally.latency.print_report();

    Ok(())
}
