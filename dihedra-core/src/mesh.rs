//! Mesh data structures and functionality

use crate::error::{Error, Result};
use crate::point::*;
use serde::{Deserialize, Serialize};

/// A triangle mesh with vertices and faces
///
/// Animation frames of the same mesh share `faces` and differ only in
/// `vertices`; [`TriangleMesh::with_vertices`] builds such a sibling frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3d>,
    pub faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3d>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Create another frame of this mesh with new vertex positions
    pub fn with_vertices(&self, vertices: Vec<Point3d>) -> Result<Self> {
        if vertices.len() != self.vertices.len() {
            return Err(Error::InvalidData(format!(
                "frame has {} vertices, mesh has {}",
                vertices.len(),
                self.vertices.len()
            )));
        }
        Ok(Self {
            vertices,
            faces: self.faces.clone(),
        })
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Check that every face references existing, distinct vertices
    pub fn validate(&self) -> Result<()> {
        let n = self.vertices.len();
        for (fi, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&v| v >= n) {
                return Err(Error::InvalidData(format!(
                    "face {} references vertex {} but mesh has {} vertices",
                    fi, bad, n
                )));
            }
            if face[0] == face[1] || face[1] == face[2] || face[2] == face[0] {
                return Err(Error::InvalidData(format!(
                    "face {} repeats a vertex: {:?}",
                    fi, face
                )));
            }
        }
        Ok(())
    }

    /// Check that `other` is a frame of the same topology
    pub fn same_topology(&self, other: &TriangleMesh) -> bool {
        self.vertices.len() == other.vertices.len() && self.faces == other.faces
    }

    /// Centroid of every face
    pub fn face_centroids(&self) -> Vec<Point3d> {
        self.faces
            .iter()
            .map(|&[a, b, c]| centroid(&self.vertices[a], &self.vertices[b], &self.vertices[c]))
            .collect()
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}
