pub mod double_tree;
pub mod nearest_neighbour;

use crate::catalog::StopCatalog;
use common::types::errors::UnknownStopError;
use common::types::{StopId, StopKey};
use geo::Point;
use itertools::Itertools;
use log::debug;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::fmt;
use std::fmt::Display;
use std::iter::once;

/// Complete graph over the stops of one vehicle and the depot. Weights are distances in meters.
pub type StopGraph = UnGraph<StopKey, f64>;

/// Visiting order of one vehicle. The last element is always the depot.
pub type Route = Vec<StopKey>;

const TWO_OPT_EPSILON: f64 = 1e-9;
const TWO_OPT_MAX_ROUNDS: usize = 100;

/// Approximate shortest open path: visit every node of a complete graph exactly once and finish
/// at `end`. Implementations must be deterministic.
pub trait PathSolver: Send + Sync {
    fn solve(&self, graph: &StopGraph, end: NodeIndex) -> Vec<NodeIndex>;
}

/// Build the complete graph. The depot is always the last node.
#[allow(deprecated)] // HaversineDistance is fine for the distances a bus drives
pub fn build_graph(catalog: &StopCatalog, members: &[StopId]) -> Result<(StopGraph, NodeIndex), SequencingError> {
    use geo::HaversineDistance;

    let keys = members.iter().copied().map(StopKey::Stop).chain(once(StopKey::Depot)).collect_vec();
    let mut graph = StopGraph::with_capacity(keys.len(), keys.len() * (keys.len() - 1) / 2);

    let mut nodes = Vec::with_capacity(keys.len());
    for key in keys {
        let position = Point::from(catalog.coordinates(key)?);
        nodes.push((graph.add_node(key), position));
    }

    for ((a, position_a), (b, position_b)) in nodes.iter().tuple_combinations() {
        graph.add_edge(*a, *b, position_a.haversine_distance(position_b));
    }

    let depot = nodes.last().map(|(node, _)| *node).ok_or(SequencingError::EmptyGraph)?;
    Ok((graph, depot))
}

/// Order the stops of one vehicle so that it drives a short way and ends at the depot.
pub fn sequence(catalog: &StopCatalog, members: &[StopId], solver: &dyn PathSolver) -> Result<Route, SequencingError> {
    if members.is_empty() {
        return Ok(vec![StopKey::Depot]);
    }

    let (graph, depot) = build_graph(catalog, members)?;
    if graph.edge_count() == 0 {
        return Ok(members.iter().copied().map(StopKey::Stop).chain(once(StopKey::Depot)).collect());
    }

    let path = solver.solve(&graph, depot);

    // Whatever the solver did with the depot, it belongs at the end
    let mut route: Route = path.into_iter()
        .map(|node| graph[node])
        .filter(|key| !key.is_depot())
        .collect();
    route.push(StopKey::Depot);

    let visits_all = route.len() == members.len() + 1
        && members.iter().all(|stop| route.contains(&StopKey::Stop(*stop)));
    if !visits_all {
        return Err(SequencingError::IncompletePath { expected: members.len() + 1, got: route.len() });
    }

    debug!(target: "sequencing", "Route {}", route.iter().join(" -> "));
    Ok(route)
}

/// Pairwise distances, indexed by node index
pub(crate) fn distance_matrix(graph: &StopGraph) -> Vec<Vec<f64>> {
    let n = graph.node_count();
    let mut matrix = vec![vec![0.0; n]; n];
    for edge in graph.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        matrix[a][b] = *edge.weight();
        matrix[b][a] = *edge.weight();
    }
    matrix
}

pub(crate) fn path_length(matrix: &[Vec<f64>], path: &[usize]) -> f64 {
    path.windows(2).map(|w| matrix[w[0]][w[1]]).sum()
}

/// 2-opt on an open path whose last element must stay in place
pub(crate) fn two_opt(matrix: &[Vec<f64>], path: &mut [usize]) {
    let n = path.len();
    if n < 3 {
        return;
    }

    for _ in 0..TWO_OPT_MAX_ROUNDS {
        let mut improved = false;
        for i in 0..n - 2 {
            for j in i + 1..n - 1 {
                let (removed_head, added_head) = match i {
                    0 => (0.0, 0.0),
                    _ => (matrix[path[i - 1]][path[i]], matrix[path[i - 1]][path[j]]),
                };
                let delta = added_head + matrix[path[i]][path[j + 1]]
                    - removed_head - matrix[path[j]][path[j + 1]];

                if delta < -TWO_OPT_EPSILON {
                    path[i..=j].reverse();
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SequencingError {
    UnknownStop(#[from] UnknownStopError),
    EmptyGraph,
    IncompletePath { expected: usize, got: usize },
}

impl Display for SequencingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SequencingError::UnknownStop(err) => write!(f, "{}", err),
            SequencingError::EmptyGraph => write!(f, "Nothing to sequence"),
            SequencingError::IncompletePath { expected, got } => {
                write!(f, "Path visits {got} stops, expected {expected}")
            }
        }
    }
}
