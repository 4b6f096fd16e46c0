use crate::sequencing::{distance_matrix, two_opt, PathSolver, StopGraph};
use ordered_float::OrderedFloat;
use petgraph::graph::NodeIndex;
use std::collections::BTreeSet;

/// Greedy alternative to [crate::sequencing::double_tree::DoubleTreeSolver]. Starts at the end
/// node and keeps stepping to the closest node not seen yet, then reverses the walk.
#[derive(Debug, Clone, Default)]
pub struct NearestNeighbourSolver {
    pub improve: bool,
}

impl PathSolver for NearestNeighbourSolver {
    fn solve(&self, graph: &StopGraph, end: NodeIndex) -> Vec<NodeIndex> {
        let matrix = distance_matrix(graph);

        let mut unvisited: BTreeSet<usize> = graph.node_indices()
            .map(|node| node.index())
            .filter(|node| *node != end.index())
            .collect();
        let mut walk = vec![end.index()];
        let mut current = end.index();

        // Ties go to the lower index
        while let Some(next) = unvisited.iter().copied().min_by_key(|node| OrderedFloat(matrix[current][*node])) {
            unvisited.remove(&next);
            walk.push(next);
            current = next;
        }

        walk.reverse();
        if self.improve {
            two_opt(&matrix, &mut walk);
        }

        walk.into_iter().map(NodeIndex::new).collect()
    }
}
