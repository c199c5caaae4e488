//! Diffusion encoder
//!
//! Walks the spanning tree from the root face and records, for every arc
//! `(parent, child)`, how much the signed dihedral angle between the two faces
//! changed from the previous to the current frame. Relative orientation is
//! all that is stored, so any rigid motion shared by the whole current frame
//! leaves the angles untouched; the root anchor restores absolute placement.

use dihedra_core::{face_local_frames, Error, LocalFrame, Point3d, Result};
use dihedra_graph::{SpanningTree, TreeArc, TreeWalk};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use tracing::{debug, info};

/// Encoder output for one frame pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaAngles {
    pub root_face: usize,
    pub leaf_face: usize,
    /// Frame of the root face in the current frame
    pub root_anchor: LocalFrame,
    /// Frame of the leaf face in the current frame, kept for drift checks
    pub leaf_anchor: LocalFrame,
    /// One value per tree arc, in walk order
    pub deltas: Vec<f64>,
}

/// Wrap an angle into `[-pi, pi)`
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Signed dihedral angle across a tree arc.
///
/// Measured about the shared edge, oriented as in the parent's winding, from
/// the parent's normal to the child's normal. Zero for coplanar faces.
pub fn signed_dihedral(arc: &TreeArc, frames: &[LocalFrame], positions: &[Point3d]) -> f64 {
    let axis = (positions[arc.edge[1]] - positions[arc.edge[0]]).normalize();
    let np = frames[arc.parent].normal();
    let nc = frames[arc.child].normal();
    np.cross(&nc).dot(&axis).atan2(np.dot(&nc))
}

/// Stateless encoder of frame pairs into delta angles
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffusionEncoder;

impl DiffusionEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode the motion from `prev` to `curr` along `tree`.
    ///
    /// Fails with [`Error::Range`] if the root or leaf face is out of range,
    /// and with [`Error::Topology`] if the tree does not reach every face.
    pub fn encode(
        &self,
        triangles: &[[usize; 3]],
        prev: &[Point3d],
        curr: &[Point3d],
        tree: &SpanningTree,
        root_face: usize,
        leaf_face: usize,
    ) -> Result<DeltaAngles> {
        if leaf_face >= triangles.len() {
            return Err(Error::Range(format!(
                "leaf face {} out of range for {} faces",
                leaf_face,
                triangles.len()
            )));
        }
        let walk = TreeWalk::new(tree, triangles, root_face)?;
        self.encode_along(triangles, prev, curr, &walk, leaf_face)
    }

    /// Encode along a precomputed walk
    pub fn encode_along(
        &self,
        triangles: &[[usize; 3]],
        prev: &[Point3d],
        curr: &[Point3d],
        walk: &TreeWalk,
        leaf_face: usize,
    ) -> Result<DeltaAngles> {
        if prev.len() != curr.len() {
            return Err(Error::InvalidData(format!(
                "previous frame has {} vertices, current frame has {}",
                prev.len(),
                curr.len()
            )));
        }
        if walk.face_count() != triangles.len() {
            return Err(Error::Topology(format!(
                "walk covers {} faces but mesh has {}",
                walk.face_count(),
                triangles.len()
            )));
        }
        if leaf_face >= triangles.len() {
            return Err(Error::Range(format!(
                "leaf face {} out of range for {} faces",
                leaf_face,
                triangles.len()
            )));
        }

        let frames_prev = face_local_frames(triangles, prev)?;
        let frames_curr = face_local_frames(triangles, curr)?;

        let deltas: Vec<f64> = walk
            .arcs()
            .iter()
            .map(|arc| {
                let before = signed_dihedral(arc, &frames_prev, prev);
                let after = signed_dihedral(arc, &frames_curr, curr);
                wrap_angle(after - before)
            })
            .collect();

        if let Some((lo, hi)) = deltas.iter().copied().minmax().into_option() {
            info!("min delta: {}", lo);
            info!("max delta: {}", hi);
        }
        debug!("encoded {} delta angles from root face {}", deltas.len(), walk.root());

        Ok(DeltaAngles {
            root_face: walk.root(),
            leaf_face,
            root_anchor: frames_curr[walk.root()],
            leaf_anchor: frames_curr[leaf_face],
            deltas,
        })
    }
}
