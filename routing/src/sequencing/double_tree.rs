use crate::sequencing::{distance_matrix, two_opt, PathSolver, StopGraph};
use petgraph::algo::min_spanning_tree;
use petgraph::data::FromElements;
use petgraph::graph::NodeIndex;
use petgraph::visit::Dfs;

/// Double-tree heuristic: walking a minimum spanning tree in preorder gives a round trip at most
/// twice as long as the optimal one (distances obey the triangle inequality). The longer of the two
/// edges touching the end node is dropped to open the round trip, then 2-opt shortens the result.
#[derive(Debug, Clone)]
pub struct DoubleTreeSolver {
    pub improve: bool,
}

impl Default for DoubleTreeSolver {
    fn default() -> Self {
        Self { improve: true }
    }
}

impl PathSolver for DoubleTreeSolver {
    fn solve(&self, graph: &StopGraph, end: NodeIndex) -> Vec<NodeIndex> {
        if graph.node_count() <= 2 {
            return graph.node_indices()
                .filter(|node| *node != end)
                .chain(std::iter::once(end))
                .collect();
        }

        let matrix = distance_matrix(graph);

        // Node indices are kept when building a graph from the spanning tree elements
        let tree = StopGraph::from_elements(min_spanning_tree(graph));
        let mut preorder = Vec::with_capacity(graph.node_count());
        let mut dfs = Dfs::new(&tree, end);
        while let Some(node) = dfs.next(&tree) {
            preorder.push(node.index());
        }

        // Round trip: end -> first -> ... -> last -> end
        let (end, first, last) = (end.index(), preorder[1], preorder[preorder.len() - 1]);
        let mut path: Vec<usize> = if matrix[end][first] >= matrix[last][end] {
            preorder[1..].to_vec()
        } else {
            preorder[1..].iter().rev().copied().collect()
        };
        path.push(end);

        if self.improve {
            two_opt(&matrix, &mut path);
        }

        path.into_iter().map(NodeIndex::new).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencing::{build_graph, path_length, sequence};
    use crate::tests::{case_1, line_catalog};
    use common::types::{StopId, StopKey};
    use itertools::Itertools;

    #[test]
    fn test_straight_line() {
        // Stops 0, 1, 2 lie on a line leading to the depot; the only sensible order is 0 1 2
        let route = sequence(&line_catalog(), &[StopId(1), StopId(2), StopId(0)], &DoubleTreeSolver::default()).unwrap();

        assert_eq!(route, vec![
            StopKey::Stop(StopId(0)),
            StopKey::Stop(StopId(1)),
            StopKey::Stop(StopId(2)),
            StopKey::Depot,
        ]);
    }

    #[test]
    fn test_visits_everything_once() {
        let catalog = case_1::catalog();
        let members = catalog_ids();

        let route = sequence(&catalog, &members, &DoubleTreeSolver::default()).unwrap();

        assert_eq!(route.last(), Some(&StopKey::Depot));
        assert_eq!(route.len(), members.len() + 1);
        assert!(route.iter().all_unique());
    }

    #[test]
    fn test_two_opt_never_hurts() {
        let catalog = case_1::catalog();
        let (graph, depot) = build_graph(&catalog, &catalog_ids()).unwrap();
        let matrix = distance_matrix(&graph);

        let length = |solver: DoubleTreeSolver| {
            let path = solver.solve(&graph, depot).into_iter().map(|n| n.index()).collect_vec();
            path_length(&matrix, &path)
        };

        assert!(length(DoubleTreeSolver { improve: true }) <= length(DoubleTreeSolver { improve: false }));
    }

    #[test]
    fn test_single_stop() {
        let route = sequence(&line_catalog(), &[StopId(2)], &DoubleTreeSolver::default()).unwrap();
        assert_eq!(route, vec![StopKey::Stop(StopId(2)), StopKey::Depot]);
    }

    #[test]
    fn test_deterministic() {
        let catalog = case_1::catalog();
        let solver = DoubleTreeSolver::default();
        assert_eq!(
            sequence(&catalog, &catalog_ids(), &solver).unwrap(),
            sequence(&catalog, &catalog_ids(), &solver).unwrap()
        );
    }

    fn catalog_ids() -> Vec<StopId> {
        (0..6).map(StopId).collect()
    }
}
