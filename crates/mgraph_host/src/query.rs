use anyhow::{Context, Result};
use mgraph_core::ShortestPathConfig;
use mgraph_io::parser;
use std::time::Instant;
use tracing::info;

/// Answers a single distance, path and fault query between two nodes.
pub fn run_query(
    dem_path: &str,
    source: usize,
    target: usize,
    config: ShortestPathConfig,
) -> Result<()> {
    let mut graph = parser::load_dem_file(dem_path)?;
    graph.set_config(config);

    let start = Instant::now();
    graph.compute_all_pairs_shortest_paths();
    info!(elapsed = ?start.elapsed(), "preprocessing finished");

    let distance = graph
        .distance(source, target)
        .with_context(|| format!("distance({}, {})", source, target))?;

    println!("Nodes:      {}", graph.num_nodes());
    println!("Edges:      {}", graph.num_edges());
    println!("Fault ids:  {}", graph.num_fault_ids());
    println!("Components: {}", graph.num_connected_components());
    println!("Boundary:   {:?}", graph.boundary());
    println!("Distance({}, {}) = {}", source, target, distance);

    if distance.is_finite() {
        let path = graph.shortest_path(source, target)?;
        let faults = graph.fault_ids(source, target)?;
        println!("Path:       {:?}", path);
        println!("Fault ids:  {:?}", faults);
    } else {
        println!("Nodes {} and {} are not connected.", source, target);
    }
    Ok(())
}
