//! Dijkstra shortest paths over the dual graph.
//!
//! Used to pick the leaf anchor: the face farthest from the root.

use crate::dual_graph::DualGraph;
use dihedra_core::{Error, Result};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::info;

/// State for the priority queue in Dijkstra's algorithm.
#[derive(Debug, Clone, Copy)]
struct State {
    vertex: usize,
    distance: f64,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Single-source shortest path distances.
///
/// Unreachable vertices get `f64::INFINITY`.
pub fn shortest_distances(graph: &DualGraph, source: usize) -> Result<Vec<f64>> {
    let n = graph.vertex_count();
    if source >= n {
        return Err(Error::Range(format!(
            "source face {} out of range for {} faces",
            source, n
        )));
    }

    let mut distances = vec![f64::INFINITY; n];
    let mut heap = BinaryHeap::new();
    distances[source] = 0.0;
    heap.push(State { vertex: source, distance: 0.0 });

    while let Some(State { vertex, distance }) = heap.pop() {
        // Skip stale entries
        if distance > distances[vertex] {
            continue;
        }
        for &(neighbor, weight) in graph.neighbors(vertex) {
            let candidate = distance + weight;
            if candidate < distances[neighbor] {
                distances[neighbor] = candidate;
                heap.push(State { vertex: neighbor, distance: candidate });
            }
        }
    }
    Ok(distances)
}

/// The vertex at maximum finite distance from `source`.
///
/// Ties go to the lowest vertex index: the scan keeps the first maximum it
/// meets. This is a fixed policy, not a geometric property; any other vertex
/// at the same distance would serve equally well as an anchor.
pub fn farthest_node(graph: &DualGraph, source: usize) -> Result<usize> {
    let distances = shortest_distances(graph, source)?;

    let mut max_dist = -1.0;
    let mut farthest = source;
    for (vertex, &d) in distances.iter().enumerate() {
        if d.is_finite() && d > max_dist {
            max_dist = d;
            farthest = vertex;
        }
    }
    info!("max dist from root: {}", max_dist);
    Ok(farthest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual_graph::build_dual_graph;
    use crate::fixtures::*;

    #[test]
    fn test_octahedron_farthest_face_is_antipodal() {
        let faces = octahedron_faces();
        let (_, graph) = build_dual_graph(&faces, None).unwrap();

        // the dual cube has diameter 3; face 0 (+x,+y,+z) is opposite face 6 (-x,-y,-z)
        let distances = shortest_distances(&graph, 0).unwrap();
        assert_eq!(distances[0], 0.0);
        assert_eq!(distances.iter().cloned().fold(0.0, f64::max), 3.0);
        assert_eq!(farthest_node(&graph, 0).unwrap(), 6);
    }

    #[test]
    fn test_farthest_node_is_deterministic() {
        let faces = grid_faces(4);
        let (_, graph) = build_dual_graph(&faces, None).unwrap();
        let a = farthest_node(&graph, 7).unwrap();
        let b = farthest_node(&graph, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_goes_to_first_index() {
        // path 1 - 0 - 2: both ends are at distance 1 from the middle
        let mut graph = DualGraph::new(3);
        graph.add_edge(0, 1, 1.0).unwrap();
        graph.add_edge(0, 2, 1.0).unwrap();
        assert_eq!(farthest_node(&graph, 0).unwrap(), 1);
    }

    #[test]
    fn test_weighted_distances() {
        let mut graph = DualGraph::new(3);
        graph.add_edge(0, 1, 4.0).unwrap();
        graph.add_edge(0, 2, 1.0).unwrap();
        graph.add_edge(2, 1, 1.0).unwrap();
        let distances = shortest_distances(&graph, 0).unwrap();
        assert_eq!(distances, vec![0.0, 2.0, 1.0]);
        assert_eq!(farthest_node(&graph, 0).unwrap(), 1);
    }

    #[test]
    fn test_unreachable_vertices_are_ignored() {
        let mut graph = DualGraph::new(3);
        graph.add_edge(0, 1, 1.0).unwrap();
        let distances = shortest_distances(&graph, 0).unwrap();
        assert!(distances[2].is_infinite());
        assert_eq!(farthest_node(&graph, 0).unwrap(), 1);
    }

    #[test]
    fn test_source_out_of_range() {
        let graph = DualGraph::new(2);
        assert!(matches!(farthest_node(&graph, 2), Err(Error::Range(_))));
    }
}
