//! Edge-to-face adjacency for triangle meshes.
//!
//! Maps every undirected mesh edge to the one (boundary) or two (interior)
//! faces that contain it. Edges shared by three or more faces make the mesh
//! non-manifold and are rejected.

use dihedra_core::{Error, Result};
use std::collections::HashMap;

/// Faces incident to one undirected mesh edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFaces {
    pub first: usize,
    pub second: Option<usize>,
}

impl EdgeFaces {
    /// A boundary edge borders exactly one face
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.second.is_none()
    }
}

/// Undirected edge list of a triangle mesh with incident faces
#[derive(Debug, Clone)]
pub struct EdgeFaceAdjacency {
    /// Canonical `(min, max)` vertex pairs, sorted
    edges: Vec<(usize, usize)>,
    /// Incident faces, parallel to `edges`
    faces: Vec<EdgeFaces>,
    lookup: HashMap<(usize, usize), usize>,
}

#[inline]
fn canonical(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl EdgeFaceAdjacency {
    /// Build the adjacency index of a triangle list.
    ///
    /// Fails with [`Error::Topology`] when an edge borders more than two faces.
    pub fn build(triangles: &[[usize; 3]]) -> Result<Self> {
        let mut incident: HashMap<(usize, usize), Vec<usize>> =
            HashMap::with_capacity(triangles.len() * 3 / 2 + 1);

        for (fi, &[v0, v1, v2]) in triangles.iter().enumerate() {
            for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
                if a == b {
                    return Err(Error::Topology(format!(
                        "face {} has a collapsed edge ({}, {})",
                        fi, a, b
                    )));
                }
                incident.entry(canonical(a, b)).or_default().push(fi);
            }
        }

        let mut edges: Vec<(usize, usize)> = incident.keys().copied().collect();
        edges.sort_unstable();

        let mut faces = Vec::with_capacity(edges.len());
        let mut lookup = HashMap::with_capacity(edges.len());
        for (ei, edge) in edges.iter().enumerate() {
            let around = &incident[edge];
            let entry = match around.as_slice() {
                [f] => EdgeFaces { first: *f, second: None },
                [f, g] if f != g => EdgeFaces { first: *f, second: Some(*g) },
                _ => {
                    return Err(Error::Topology(format!(
                        "edge ({}, {}) is shared by faces {:?}; mesh is non-manifold",
                        edge.0, edge.1, around
                    )))
                }
            };
            faces.push(entry);
            lookup.insert(*edge, ei);
        }

        Ok(Self { edges, faces, lookup })
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Canonical edge list in sorted order
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Iterate over edges with their incident faces
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), EdgeFaces)> + '_ {
        self.edges.iter().copied().zip(self.faces.iter().copied())
    }

    /// Faces incident to edge `(a, b)` in either orientation
    pub fn query(&self, a: usize, b: usize) -> Option<EdgeFaces> {
        self.lookup.get(&canonical(a, b)).map(|&ei| self.faces[ei])
    }

    /// Count boundary edges
    pub fn boundary_edge_count(&self) -> usize {
        self.faces.iter().filter(|f| f.is_boundary()).count()
    }
}

/// The mesh edge shared by faces `parent` and `child`, oriented as it
/// appears in `parent`'s winding
pub fn shared_edge(triangles: &[[usize; 3]], parent: usize, child: usize) -> Option<[usize; 2]> {
    let p = triangles[parent];
    let c = triangles[child];
    (0..3)
        .map(|k| [p[k], p[(k + 1) % 3]])
        .find(|[a, b]| c.contains(a) && c.contains(b))
}
