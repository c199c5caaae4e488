//! Dual graph of a triangle mesh.
//!
//! Vertices are faces; an edge joins two faces that share an interior mesh
//! edge. Boundary edges contribute nothing.

use crate::adjacency::EdgeFaceAdjacency;
use crate::export::write_graphviz;
use dihedra_core::{Error, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Weight given to every dual edge
pub const DUAL_EDGE_WEIGHT: f64 = 1.0;

/// Weighted undirected dual edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualEdge {
    pub u: usize,
    pub v: usize,
    pub weight: f64,
}

/// Undirected weighted graph over face indices
#[derive(Debug, Clone, Default)]
pub struct DualGraph {
    edges: Vec<DualEdge>,
    /// For each vertex, list of (neighbor, weight) pairs
    neighbors: Vec<Vec<(usize, f64)>>,
}

impl DualGraph {
    /// Graph with `vertex_count` isolated vertices
    pub fn new(vertex_count: usize) -> Self {
        Self {
            edges: Vec::new(),
            neighbors: vec![Vec::new(); vertex_count],
        }
    }

    /// Add an undirected edge
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<()> {
        let n = self.neighbors.len();
        if u >= n || v >= n {
            return Err(Error::Range(format!(
                "dual edge ({}, {}) outside graph of {} vertices",
                u, v, n
            )));
        }
        if !(weight >= 0.0) {
            return Err(Error::InvalidData(format!(
                "dual edge ({}, {}) has invalid weight {}",
                u, v, weight
            )));
        }
        self.edges.push(DualEdge { u, v, weight });
        self.neighbors[u].push((v, weight));
        self.neighbors[v].push((u, weight));
        Ok(())
    }

    /// Build the dual graph from an edge-to-face index
    pub fn from_adjacency(face_count: usize, adjacency: &EdgeFaceAdjacency) -> Result<Self> {
        let mut graph = Self::new(face_count);
        for (_, faces) in adjacency.iter() {
            if let Some(second) = faces.second {
                graph.add_edge(faces.first, second, DUAL_EDGE_WEIGHT)?;
            }
        }
        Ok(graph)
    }

    /// Number of vertices (faces)
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of undirected edges
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[DualEdge] {
        &self.edges
    }

    /// Neighbors of a vertex with edge weights
    #[inline]
    pub fn neighbors(&self, vertex: usize) -> &[(usize, f64)] {
        self.neighbors.get(vertex).map_or(&[], |v| v.as_slice())
    }

    /// Check whether every vertex is reachable from vertex 0
    pub fn is_connected(&self) -> bool {
        let n = self.vertex_count();
        if n == 0 {
            return true;
        }
        let mut seen = vec![false; n];
        let mut stack = vec![0];
        seen[0] = true;
        let mut count = 1;
        while let Some(v) = stack.pop() {
            for &(w, _) in self.neighbors(v) {
                if !seen[w] {
                    seen[w] = true;
                    count += 1;
                    stack.push(w);
                }
            }
        }
        count == n
    }

    /// Write the graph in Graphviz dot format
    pub fn write_dot<W: std::io::Write>(&self, writer: W) -> Result<()> {
        write_graphviz(writer, self.vertex_count(), self.edges.iter().map(|e| (e.u, e.v)))
    }
}

/// Build the edge adjacency index and dual graph of a triangle list.
///
/// When `dot_file` is given, the graph is also dumped there in dot format.
pub fn build_dual_graph(
    triangles: &[[usize; 3]],
    dot_file: Option<&Path>,
) -> Result<(EdgeFaceAdjacency, DualGraph)> {
    let adjacency = EdgeFaceAdjacency::build(triangles)?;
    let graph = DualGraph::from_adjacency(triangles.len(), &adjacency)?;
    debug!(
        "dual graph: {} vertices, {} edges ({} boundary mesh edges skipped)",
        graph.vertex_count(),
        graph.edge_count(),
        adjacency.boundary_edge_count()
    );

    if let Some(path) = dot_file {
        graph.write_dot(BufWriter::new(File::create(path)?))?;
    }
    Ok((adjacency, graph))
}
