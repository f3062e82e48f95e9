//! # Graph Input
//!
//! Command-line graph arguments are either paths to JSON files or generator
//! specs.
//!
//! A JSON file holds one `SerializableGraph` or an array of them. A
//! generator spec is `family[:params]`:
//!
//! | Spec            | Graph                                |
//! |-----------------|--------------------------------------|
//! | `empty:N`       | N isolated vertices                  |
//! | `complete:N`    | K_N                                  |
//! | `cycle:N`       | C_N                                  |
//! | `path:N`        | P_N                                  |
//! | `star:N`        | star with N leaves                   |
//! | `wheel:N`       | hub joined to C_(N-1)                |
//! | `ladder:N`      | ladder with N rungs                  |
//! | `grid:RxC`      | R by C grid                          |
//! | `bipartite:MxN` | K_(M,N)                              |
//! | `barbell:A:B`   | two K_A joined by a path of B        |
//! | `petersen`      | the Petersen graph                   |

use graphcalc_core::generators::{
    barbell_graph, complete_bipartite_graph, complete_graph, cycle_graph, empty_graph,
    grid_2d_graph, ladder_graph, path_graph, petersen_graph, star_graph, wheel_graph,
};
use graphcalc_core::{Graph, GraphCalcError, GraphView, SerializableGraph};
use std::path::Path;
use tracing::debug;

/// Maximum graph file size (64 MB).
const MAX_GRAPH_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Largest order a generator spec may ask for.
const MAX_GENERATED_ORDER: u64 = 100_000;

// =============================================================================
// FILES
// =============================================================================

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum GraphFile {
    One(SerializableGraph),
    Many(Vec<SerializableGraph>),
}

/// Parse JSON text holding one graph or an array of graphs.
pub fn parse_graph_json(text: &str) -> Result<Vec<Graph>, GraphCalcError> {
    let parsed: GraphFile = serde_json::from_str(text)
        .map_err(|e| GraphCalcError::SerializationError(format!("Invalid graph JSON: {}", e)))?;
    let graphs = match parsed {
        GraphFile::One(sg) => vec![sg],
        GraphFile::Many(list) => list,
    };
    graphs.into_iter().map(Graph::try_from).collect()
}

/// Read every graph in a JSON file.
///
/// Unnamed graphs are named after the file, with an index when the file
/// holds more than one.
pub fn load_graph_file(path: &Path) -> Result<Vec<Graph>, GraphCalcError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GraphCalcError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    if metadata.len() > MAX_GRAPH_FILE_SIZE {
        return Err(GraphCalcError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_GRAPH_FILE_SIZE
        )));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| GraphCalcError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    let graphs = parse_graph_json(&text)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let single = graphs.len() == 1;
    Ok(graphs
        .into_iter()
        .enumerate()
        .map(|(i, graph)| {
            if graph.name().is_some() {
                graph
            } else if single {
                graph.with_name(stem.clone())
            } else {
                graph.with_name(format!("{}[{}]", stem, i))
            }
        })
        .collect())
}

// =============================================================================
// GENERATOR SPECS
// =============================================================================

fn bad_spec(spec: &str, reason: &str) -> GraphCalcError {
    GraphCalcError::InvalidParameter {
        name: "graph",
        reason: format!("'{}': {}", spec, reason),
    }
}

fn parse_count(spec: &str, raw: Option<&str>) -> Result<u64, GraphCalcError> {
    let raw = raw.ok_or_else(|| bad_spec(spec, "missing size"))?;
    let n: u64 = raw
        .trim()
        .parse()
        .map_err(|_| bad_spec(spec, "size is not a non-negative integer"))?;
    if n > MAX_GENERATED_ORDER {
        return Err(bad_spec(spec, "size too large"));
    }
    Ok(n)
}

fn parse_pair(spec: &str, raw: Option<&str>) -> Result<(u64, u64), GraphCalcError> {
    let raw = raw.ok_or_else(|| bad_spec(spec, "missing dimensions"))?;
    let (a, b) = raw
        .split_once(['x', 'X', ','])
        .ok_or_else(|| bad_spec(spec, "dimensions must look like AxB"))?;
    let a = parse_count(spec, Some(a))?;
    let b = parse_count(spec, Some(b))?;
    if a.saturating_mul(b) > MAX_GENERATED_ORDER {
        return Err(bad_spec(spec, "size too large"));
    }
    Ok((a, b))
}

/// Build a graph from a generator spec such as `cycle:6` or `grid:3x4`.
pub fn parse_generator(spec: &str) -> Result<Graph, GraphCalcError> {
    let mut parts = spec.trim().splitn(2, ':');
    let family = parts.next().unwrap_or_default().to_ascii_lowercase();
    let rest = parts.next();

    let graph = match family.as_str() {
        "empty" => empty_graph(parse_count(spec, rest)?),
        "complete" | "k" => complete_graph(parse_count(spec, rest)?),
        "cycle" | "c" => cycle_graph(parse_count(spec, rest)?),
        "path" | "p" => path_graph(parse_count(spec, rest)?),
        "star" => star_graph(parse_count(spec, rest)?),
        "wheel" | "w" => wheel_graph(parse_count(spec, rest)?),
        "ladder" => ladder_graph(parse_count(spec, rest)?),
        "grid" => {
            let (rows, cols) = parse_pair(spec, rest)?;
            grid_2d_graph(rows, cols)
        }
        "bipartite" | "complete_bipartite" => {
            let (m, n) = parse_pair(spec, rest)?;
            complete_bipartite_graph(m, n)
        }
        "barbell" => {
            let raw = rest.ok_or_else(|| bad_spec(spec, "missing sizes"))?;
            let (bell, handle) = raw
                .split_once(':')
                .ok_or_else(|| bad_spec(spec, "expected barbell:A:B"))?;
            barbell_graph(parse_count(spec, Some(bell))?, parse_count(spec, Some(handle))?)
        }
        "petersen" => {
            if rest.is_some() {
                return Err(bad_spec(spec, "petersen takes no parameters"));
            }
            petersen_graph()
        }
        _ => return Err(bad_spec(spec, "unknown graph family")),
    };
    debug!(spec, order = graph.order(), "generated graph");
    Ok(graph)
}

/// Resolve command-line graph arguments in order.
///
/// An argument naming an existing file, or ending in `.json`, is read as a
/// file; anything else is a generator spec.
pub fn load_graphs<S: AsRef<str>>(args: &[S]) -> Result<Vec<Graph>, GraphCalcError> {
    let mut graphs = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        let path = Path::new(arg);
        if path.is_file() || arg.ends_with(".json") {
            graphs.extend(load_graph_file(path)?);
        } else {
            graphs.push(parse_generator(arg)?);
        }
    }
    Ok(graphs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_specs() {
        let c6 = parse_generator("cycle:6").expect("cycle");
        assert_eq!((c6.order(), GraphView::edges(&c6).len()), (6, 6));
        let grid = parse_generator("grid:3x4").expect("grid");
        assert_eq!(grid.order(), 12);
        let k23 = parse_generator("bipartite:2,3").expect("bipartite");
        assert_eq!(GraphView::edges(&k23).len(), 6);
        let petersen = parse_generator("Petersen").expect("petersen");
        assert_eq!(petersen.order(), 10);
        assert_eq!(parse_generator("star:4").expect("star").order(), 5);
    }

    #[test]
    fn malformed_specs_are_rejected() {
        for spec in ["cycle", "cycle:x", "grid:3", "barbell:3", "petersen:2", "moebius:8", "path:-1"] {
            assert!(
                matches!(parse_generator(spec), Err(GraphCalcError::InvalidParameter { .. })),
                "{} should be rejected",
                spec
            );
        }
    }

    #[test]
    fn json_single_and_list() {
        let one = parse_graph_json(r#"{"name": "tri", "edges": [[0, 1], [1, 2], [2, 0]]}"#).expect("one");
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].name(), Some("tri"));

        let many = parse_graph_json(r#"[{"edges": [[0, 1]]}, {"vertices": [0, 1, 2], "edges": []}]"#)
            .expect("many");
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].order(), 3);

        assert!(matches!(
            parse_graph_json(r#"{"edges": [[1, 1]]}"#),
            Err(GraphCalcError::SelfLoop(_))
        ));
        assert!(matches!(
            parse_graph_json("not json"),
            Err(GraphCalcError::SerializationError(_))
        ));
    }
}
