//! Parser for detector error model files.
//!
//! Provides functions for parsing Stim .dem (Detector Error Model) files,
//! which describe independent error mechanisms and the detectors and logical
//! observables each one flips. Every graphlike mechanism becomes an edge of a
//! MatchingGraph; mechanisms that flip a single detector are connected to a
//! virtual boundary node appended after the last detector.

use anyhow::{Context, Result, anyhow, bail};
use mgraph_core::{FaultSet, MatchingGraph};
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, map, map_res, opt, value};
use nom::multi::{many0, separated_list0};
use nom::number::complete::double;
use nom::sequence::{delimited, preceded, terminated, tuple};
use std::collections::BTreeSet;
use std::path::Path;

/// One target of a DEM instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemTarget {
    /// Relative detector index (`D<k>`), before `shift_detectors` offsets.
    Detector(usize),
    /// Logical observable index (`L<k>`).
    Observable(usize),
    /// Decomposition separator (`^`).
    Separator,
}

/// A single parsed DEM instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum DemInstruction {
    Error {
        probability: f64,
        targets: Vec<DemTarget>,
    },
    Detector {
        targets: Vec<DemTarget>,
    },
    LogicalObservable {
        targets: Vec<DemTarget>,
    },
    ShiftDetectors {
        offset: usize,
    },
}

fn index(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

fn args(input: &str) -> IResult<&str, Vec<f64>> {
    delimited(
        char('('),
        separated_list0(delimited(space0, char(','), space0), preceded(space0, double)),
        preceded(space0, char(')')),
    )(input)
}

fn target(input: &str) -> IResult<&str, DemTarget> {
    alt((
        map(preceded(char('D'), index), DemTarget::Detector),
        map(preceded(char('L'), index), DemTarget::Observable),
        value(DemTarget::Separator, char('^')),
    ))(input)
}

fn targets(input: &str) -> IResult<&str, Vec<DemTarget>> {
    many0(preceded(space1, target))(input)
}

fn error(input: &str) -> IResult<&str, DemInstruction> {
    map_res(
        preceded(tag("error"), tuple((preceded(space0, args), targets))),
        |(args, targets): (Vec<f64>, Vec<DemTarget>)| match args.as_slice() {
            [probability] => Ok(DemInstruction::Error {
                probability: *probability,
                targets,
            }),
            _ => Err("error takes exactly one probability argument"),
        },
    )(input)
}

fn detector(input: &str) -> IResult<&str, DemInstruction> {
    map(
        preceded(tuple((tag("detector"), opt(preceded(space0, args)))), targets),
        |targets| DemInstruction::Detector { targets },
    )(input)
}

fn logical_observable(input: &str) -> IResult<&str, DemInstruction> {
    map(preceded(tag("logical_observable"), targets), |targets| {
        DemInstruction::LogicalObservable { targets }
    })(input)
}

fn shift_detectors(input: &str) -> IResult<&str, DemInstruction> {
    map(
        preceded(
            tuple((tag("shift_detectors"), opt(preceded(space0, args)), space1)),
            index,
        ),
        |offset| DemInstruction::ShiftDetectors { offset },
    )(input)
}

/// Parses one comment-free, non-empty DEM line.
pub fn parse_instruction(line: &str) -> Result<DemInstruction> {
    let parsed = all_consuming(terminated(
        alt((error, logical_observable, shift_detectors, detector)),
        space0,
    ))(line.trim());
    parsed
        .map(|(_, instruction)| instruction)
        .map_err(|e| anyhow!("{}", e))
}

/// Parses DEM text into its instruction list, tagged with 1-based line numbers.
pub fn parse_instructions(text: &str) -> Result<Vec<(usize, DemInstruction)>> {
    let mut instructions = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("repeat") || line == "}" {
            bail!("line {}: repeat blocks are not supported", line_no);
        }
        let instruction =
            parse_instruction(line).with_context(|| format!("line {}: {:?}", line_no, line))?;
        instructions.push((line_no, instruction));
    }
    Ok(instructions)
}

/// Graphlike piece of an error mechanism after resolving shifts.
struct Component {
    detectors: Vec<usize>,
    observables: FaultSet,
}

/// Absolute detector id of a relative `D<k>` target.
fn resolve(d: usize, offset: usize) -> Result<usize> {
    d.checked_add(offset)
        .filter(|&id| id < usize::MAX)
        .ok_or_else(|| anyhow!("detector D{} shifted by {} is out of range", d, offset))
}

/// Splits targets on `^` and applies the detector offset.
///
/// Repeated targets inside one component cancel in pairs.
fn components(targets: &[DemTarget], offset: usize) -> Result<Vec<Component>> {
    targets
        .split(|t| *t == DemTarget::Separator)
        .map(|part| {
            let mut detectors = BTreeSet::new();
            let mut observables = FaultSet::new();
            for target in part {
                match *target {
                    DemTarget::Detector(d) => {
                        let id = resolve(d, offset)?;
                        if !detectors.remove(&id) {
                            detectors.insert(id);
                        }
                    }
                    DemTarget::Observable(l) => {
                        if !observables.remove(&l) {
                            observables.insert(l);
                        }
                    }
                    DemTarget::Separator => {}
                }
            }
            Ok(Component {
                detectors: detectors.into_iter().collect(),
                observables,
            })
        })
        .collect()
}

/// Converts an error probability into a log-likelihood weight.
///
/// Returns None for `p == 0`, which never fires and contributes no edge.
pub fn probability_to_weight(p: f64) -> Result<Option<f64>> {
    if !(0.0..=0.5).contains(&p) {
        bail!("error probability {} must lie in [0, 0.5]", p);
    }
    if p == 0.0 {
        return Ok(None);
    }
    Ok(Some(((1.0 - p) / p).ln()))
}

/// Builds a MatchingGraph from DEM text.
///
/// # Arguments
///
/// * `text` - Contents of a .dem file
///
/// # Returns
///
/// A graph with one node per detector, plus a boundary node when some
/// mechanism with non-zero probability flips a single detector, or an error
/// naming the offending line.
pub fn parse_dem(text: &str) -> Result<MatchingGraph> {
    let instructions = parse_instructions(text)?;

    let mut offset: usize = 0;
    let mut num_detectors: usize = 0;
    let mut mechanisms = Vec::new();

    for (line_no, instruction) in instructions {
        match instruction {
            DemInstruction::Error {
                probability,
                targets,
            } => {
                for t in &targets {
                    if let DemTarget::Detector(d) = t {
                        let id = resolve(*d, offset).with_context(|| format!("line {}", line_no))?;
                        num_detectors = num_detectors.max(id + 1);
                    }
                }
                let weight = match probability_to_weight(probability)
                    .with_context(|| format!("line {}", line_no))?
                {
                    Some(w) => w,
                    None => {
                        tracing::warn!(
                            line = line_no,
                            "skipping error mechanism with zero probability"
                        );
                        continue;
                    }
                };
                let comps =
                    components(&targets, offset).with_context(|| format!("line {}", line_no))?;
                mechanisms.push((line_no, probability, weight, comps));
            }
            DemInstruction::Detector { targets } => {
                for t in targets {
                    if let DemTarget::Detector(d) = t {
                        let id = resolve(d, offset).with_context(|| format!("line {}", line_no))?;
                        num_detectors = num_detectors.max(id + 1);
                    }
                }
            }
            DemInstruction::LogicalObservable { .. } => {}
            DemInstruction::ShiftDetectors { offset: shift } => {
                offset = offset.checked_add(shift).ok_or_else(|| {
                    anyhow!("line {}: shift_detectors overflows the detector offset", line_no)
                })?;
            }
        }
    }

    let needs_boundary = mechanisms
        .iter()
        .any(|(_, _, _, comps)| comps.iter().any(|c| c.detectors.len() == 1));
    let boundary_node = num_detectors;
    let (num_nodes, boundary) = if needs_boundary {
        let num_nodes = num_detectors
            .checked_add(1)
            .ok_or_else(|| anyhow!("too many detectors to add a boundary node"))?;
        (num_nodes, vec![boundary_node])
    } else {
        (num_detectors, Vec::new())
    };

    let mut graph = MatchingGraph::new(num_nodes, boundary)?;

    for (line_no, p, weight, comps) in mechanisms {
        for comp in comps {
            let (u, v) = match comp.detectors.as_slice() {
                [] => {
                    tracing::warn!(line = line_no, "skipping component with no detectors");
                    continue;
                }
                [d] => (*d, boundary_node),
                [a, b] => (*a, *b),
                many => bail!(
                    "line {}: component flips {} detectors; decompose it with '^'",
                    line_no,
                    many.len()
                ),
            };
            graph
                .add_edge_with_probability(u, v, comp.observables, weight, p)
                .with_context(|| format!("line {}", line_no))?;
        }
    }

    tracing::info!(
        nodes = graph.num_nodes(),
        edges = graph.num_edges(),
        fault_ids = graph.num_fault_ids(),
        "parsed detector error model"
    );
    Ok(graph)
}

/// Loads a Stim .dem file and constructs a MatchingGraph.
///
/// The returned graph has not been preprocessed; call
/// `compute_all_pairs_shortest_paths` before querying distances.
pub fn load_dem_file<P: AsRef<Path>>(path: P) -> Result<MatchingGraph> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open .dem file {}", path.display()))?;
    parse_dem(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_line() {
        assert_eq!(
            parse_instruction("error(0.125) D0 D3 L1").unwrap(),
            DemInstruction::Error {
                probability: 0.125,
                targets: vec![
                    DemTarget::Detector(0),
                    DemTarget::Detector(3),
                    DemTarget::Observable(1)
                ],
            }
        );
        assert_eq!(
            parse_instruction("error( 0.5 ) D1 ^ D2").unwrap(),
            DemInstruction::Error {
                probability: 0.5,
                targets: vec![
                    DemTarget::Detector(1),
                    DemTarget::Separator,
                    DemTarget::Detector(2)
                ],
            }
        );
    }

    #[test]
    fn test_parse_other_instructions() {
        assert_eq!(
            parse_instruction("detector(1, 2.5, 0) D7").unwrap(),
            DemInstruction::Detector {
                targets: vec![DemTarget::Detector(7)]
            }
        );
        assert_eq!(
            parse_instruction("logical_observable L0").unwrap(),
            DemInstruction::LogicalObservable {
                targets: vec![DemTarget::Observable(0)]
            }
        );
        assert_eq!(
            parse_instruction("shift_detectors(0, 1) 4").unwrap(),
            DemInstruction::ShiftDetectors { offset: 4 }
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_instruction("error(0.1, 0.2) D0").is_err());
        assert!(parse_instruction("error D0").is_err());
        assert!(parse_instruction("error(0.1) X0").is_err());
        assert!(parse_instruction("mystery D0").is_err());
    }

    #[test]
    fn test_probability_to_weight() {
        assert_eq!(probability_to_weight(0.0).unwrap(), None);
        assert_eq!(probability_to_weight(0.5).unwrap(), Some(0.0));
        let w = probability_to_weight(0.1).unwrap().unwrap();
        assert!((w - 9.0f64.ln()).abs() < 1e-12);
        assert!(probability_to_weight(0.6).is_err());
        assert!(probability_to_weight(-0.1).is_err());
    }

    #[test]
    fn test_parse_dem_repetition_code() {
        let dem = "\
# distance-3 repetition code
error(0.1) D0 L0
error(0.1) D0 D1
error(0.1) D1
detector(0) D0
detector(1) D1
logical_observable L0
";
        let mut graph = parse_dem(dem).unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert_eq!(graph.boundary(), vec![2]);
        assert_eq!(graph.num_edges(), 3);
        assert_eq!(graph.fault_ids_of_edge(0, 2).unwrap(), &FaultSet::from([0]));
        assert!(graph.all_edges_have_error_probabilities());

        graph.compute_all_pairs_shortest_paths();
        let w = 9.0f64.ln();
        assert!((graph.distance(0, 1).unwrap() - w).abs() < 1e-12);
        assert_eq!(graph.shortest_path(0, 2).unwrap(), vec![0, 2]);
    }

    #[test]
    fn test_parse_dem_decomposition_and_shift() {
        let dem = "\
error(0.01) D0 D1 ^ D2 L0
shift_detectors 2
error(0.01) D0 D1 # inline comment
detector D3
";
        let graph = parse_dem(dem).unwrap();
        // detectors 0..=5 plus a boundary node
        assert_eq!(graph.num_nodes(), 7);
        assert!(graph.has_edge(0, 1));
        assert!(graph.has_edge(2, 6));
        assert!(graph.has_edge(2, 3));
        assert_eq!(graph.fault_ids_of_edge(2, 6).unwrap(), &FaultSet::from([0]));
        assert!(graph.fault_ids_of_edge(0, 1).unwrap().is_empty());
    }

    #[test]
    fn test_parse_dem_without_boundary() {
        let graph = parse_dem("error(0.2) D0 D1\nerror(0) D1 D2\n").unwrap();
        assert_eq!(graph.num_nodes(), 3);
        assert!(graph.boundary().is_empty());
        assert_eq!(graph.num_edges(), 1);
    }

    #[test]
    fn test_parse_dem_rejects_hyperedges_and_repeat() {
        assert!(parse_dem("error(0.1) D0 D1 D2\n").is_err());
        assert!(parse_dem("repeat 3 {\nerror(0.1) D0 D1\n}\n").is_err());
        assert!(parse_dem("error(0.7) D0 D1\n").is_err());
    }

    #[test]
    fn test_parse_dem_rejects_detector_overflow() {
        let err = parse_dem("error(0.1) D18446744073709551615 D0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));

        let shifted = "error(0.1) D0 D1\nshift_detectors 18446744073709551615\nerror(0.1) D1 D2\n";
        let err = parse_dem(shifted).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));

        let shift_overflow = "shift_detectors 18446744073709551615\nshift_detectors 1\n";
        assert!(parse_dem(shift_overflow).is_err());

        assert!(parse_dem("detector D18446744073709551615\n").is_err());
    }

    #[test]
    fn test_zero_probability_single_detector_adds_no_boundary() {
        let graph = parse_dem("error(0.1) D0 D1\nerror(0) D1\n").unwrap();
        assert_eq!(graph.num_nodes(), 2);
        assert!(graph.boundary().is_empty());
        assert_eq!(graph.num_edges(), 1);
    }
}
