//! Minimum spanning tree of the dual graph.
//!
//! Kruskal's algorithm: candidate edges sorted by weight, union-find rejects
//! the ones that would close a cycle. The result is stored as a doubled arc
//! list so neighbors can be enumerated from either endpoint in O(degree).

use crate::dual_graph::DualGraph;
use crate::export::write_graphviz;
use dihedra_core::{Error, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

const NONE: usize = usize::MAX;

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]]; // Path compression
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets of `a` and `b`; returns false if they were already one
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Spanning tree stored as paired directed arcs.
///
/// Arc `2k` runs `u -> v` and arc `2k + 1` runs back `v -> u` for tree edge
/// `k`. `first[x]` heads the singly linked list of arcs leaving `x`, chained
/// through `next`.
#[derive(Debug, Clone)]
pub struct SpanningTree {
    u: Vec<usize>,
    v: Vec<usize>,
    first: Vec<usize>,
    next: Vec<usize>,
}

impl SpanningTree {
    fn with_capacity(vertex_count: usize, edge_count: usize) -> Self {
        Self {
            u: Vec::with_capacity(2 * edge_count),
            v: Vec::with_capacity(2 * edge_count),
            first: vec![NONE; vertex_count],
            next: Vec::with_capacity(2 * edge_count),
        }
    }

    fn push_arc(&mut self, from: usize, to: usize) {
        let k = self.u.len();
        self.u.push(from);
        self.v.push(to);
        self.next.push(self.first[from]);
        self.first[from] = k;
    }

    fn add_edge(&mut self, a: usize, b: usize) {
        self.push_arc(a, b);
        self.push_arc(b, a);
    }

    /// Number of tree vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.first.len()
    }

    /// Number of undirected tree edges
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.u.len() / 2
    }

    /// Vertices adjacent to `vertex` in the tree, most recently added first
    pub fn neighbors(&self, vertex: usize) -> Neighbors<'_> {
        Neighbors {
            tree: self,
            arc: self.first.get(vertex).copied().unwrap_or(NONE),
        }
    }

    /// Undirected tree edges as `(u, v)` pairs, one per edge
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.edge_count()).map(move |k| (self.u[2 * k], self.v[2 * k]))
    }

    /// Write the tree in Graphviz dot format
    pub fn write_dot<W: std::io::Write>(&self, writer: W) -> Result<()> {
        write_graphviz(writer, self.vertex_count(), self.edges())
    }
}

/// Iterator over the arc list of one tree vertex
pub struct Neighbors<'a> {
    tree: &'a SpanningTree,
    arc: usize,
}

impl Iterator for Neighbors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.arc == NONE {
            return None;
        }
        let to = self.tree.v[self.arc];
        self.arc = self.tree.next[self.arc];
        Some(to)
    }
}

/// Kruskal minimum spanning tree of `graph`.
///
/// Fails with [`Error::Topology`] unless the tree has exactly
/// `vertex_count - 1` edges, which means the graph is disconnected (or empty).
/// When `dot_file` is given, the tree is also dumped there in dot format.
pub fn minimum_spanning_tree(graph: &DualGraph, dot_file: Option<&Path>) -> Result<SpanningTree> {
    let n = graph.vertex_count();
    if n == 0 {
        return Err(Error::Topology("cannot span an empty graph".to_string()));
    }

    let mut candidates: Vec<_> = graph.edges().to_vec();
    // stable: equal weights keep insertion order
    candidates.sort_by(|a, b| a.weight.total_cmp(&b.weight));

    let mut sets = UnionFind::new(n);
    let mut tree = SpanningTree::with_capacity(n, n - 1);
    let mut total_weight = 0.0;
    for edge in candidates {
        if sets.union(edge.u, edge.v) {
            tree.add_edge(edge.u, edge.v);
            total_weight += edge.weight;
            if tree.edge_count() == n - 1 {
                break;
            }
        }
    }

    if tree.edge_count() != n - 1 {
        return Err(Error::Topology(format!(
            "spanning tree has {} edges, expected {}; dual graph is disconnected",
            tree.edge_count(),
            n - 1
        )));
    }
    debug!("spanning tree: {} edges, total weight {}", tree.edge_count(), total_weight);

    if let Some(path) = dot_file {
        tree.write_dot(BufWriter::new(File::create(path)?))?;
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual_graph::build_dual_graph;
    use crate::fixtures::*;

    fn assert_is_spanning_tree(tree: &SpanningTree, n: usize) {
        assert_eq!(tree.vertex_count(), n);
        assert_eq!(tree.edge_count(), n - 1);
        let mut sets = UnionFind::new(n);
        for (a, b) in tree.edges() {
            assert!(sets.union(a, b), "edge ({}, {}) closes a cycle", a, b);
        }
    }

    #[test]
    fn test_octahedron_tree_has_seven_edges() {
        let (_, graph) = build_dual_graph(&octahedron_faces(), None).unwrap();
        let tree = minimum_spanning_tree(&graph, None).unwrap();
        assert_is_spanning_tree(&tree, 8);
    }

    #[test]
    fn test_grid_tree_is_acyclic_and_spanning() {
        let faces = grid_faces(5);
        let (_, graph) = build_dual_graph(&faces, None).unwrap();
        let tree = minimum_spanning_tree(&graph, None).unwrap();
        assert_is_spanning_tree(&tree, faces.len());
    }

    #[test]
    fn test_arcs_are_paired() {
        let (_, graph) = build_dual_graph(&octahedron_faces(), None).unwrap();
        let tree = minimum_spanning_tree(&graph, None).unwrap();
        for (a, b) in tree.edges() {
            assert!(tree.neighbors(a).any(|x| x == b));
            assert!(tree.neighbors(b).any(|x| x == a));
        }
        let degree_sum: usize = (0..8).map(|f| tree.neighbors(f).count()).sum();
        assert_eq!(degree_sum, 2 * 7);
    }

    #[test]
    fn test_weights_are_respected() {
        // square with one heavy side: the heavy edge must be left out
        let mut graph = DualGraph::new(4);
        graph.add_edge(0, 1, 1.0).unwrap();
        graph.add_edge(1, 2, 5.0).unwrap();
        graph.add_edge(2, 3, 1.0).unwrap();
        graph.add_edge(3, 0, 1.0).unwrap();

        let tree = minimum_spanning_tree(&graph, None).unwrap();
        let edges: Vec<_> = tree.edges().collect();
        assert_eq!(edges.len(), 3);
        assert!(!edges.contains(&(1, 2)));
    }

    #[test]
    fn test_disconnected_graph_is_fatal() {
        let (_, graph) = build_dual_graph(&[[0, 1, 2], [3, 4, 5]], None).unwrap();
        assert!(matches!(minimum_spanning_tree(&graph, None), Err(Error::Topology(_))));
        assert!(minimum_spanning_tree(&DualGraph::new(0), None).is_err());
    }

    #[test]
    fn test_single_face_tree() {
        let (_, graph) = build_dual_graph(&[[0, 1, 2]], None).unwrap();
        let tree = minimum_spanning_tree(&graph, None).unwrap();
        assert_eq!(tree.edge_count(), 0);
        assert_eq!(tree.neighbors(0).count(), 0);
    }

    #[test]
    fn test_union_find() {
        let mut sets = UnionFind::new(4);
        assert!(sets.union(0, 1));
        assert!(sets.union(2, 3));
        assert!(!sets.union(1, 0));
        assert_ne!(sets.find(0), sets.find(3));
        assert!(sets.union(1, 3));
        assert_eq!(sets.find(0), sets.find(2));
    }
}
