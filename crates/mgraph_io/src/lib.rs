//! I/O utilities for loading matching-graph inputs.
//!
//! Provides functions for reading detector error models (.dem files) into
//! matching graphs and for reading and writing packed syndrome shot data
//! (.b8 files). These adapters sit outside the graph engine and only use its
//! public edge-insertion API.

/// File loading utilities for packed syndrome shot data.
///
/// Reads and writes Stim .b8 files, where each shot is a little-endian bit
/// string padded to whole bytes, and converts shots to sorted lists of
/// triggered detector indices.
pub mod loader;

/// Parser for detector error models in DEM format.
///
/// Parses Stim detector error model (.dem) text into a MatchingGraph,
/// turning each graphlike error mechanism into a weighted edge annotated
/// with the logical observables it flips.
pub mod parser;
