//! Frame-level animation codec
//!
//! [`AnimationCodec`] binds the encoder, quantizer and decoder to one rest
//! mesh. The dual graph, spanning tree, leaf face and walk are derived once
//! from the rest connectivity and shared by both directions, so a frame
//! encoded by one codec decodes with any codec built from the same rest mesh
//! and root face.

use crate::decoder::{DiffusionDecoder, EdgeWeighting, Reconstruction};
use crate::encoder::{DeltaAngles, DiffusionEncoder};
use crate::quantize::{Quantizer, ValueRange};
use crate::solver::{CgConfig, LinearSolverKind};
use dihedra_core::{Error, LocalFrame, Point3d, Result, TriangleMesh};
use dihedra_graph::{
    build_dual_graph, farthest_node, minimum_spanning_tree, DualGraph, SpanningTree, TreeWalk,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Everything besides the codes needed to decode a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub bits: u32,
    pub range: ValueRange,
    pub root_face: usize,
    pub leaf_face: usize,
    pub root_anchor: LocalFrame,
    pub leaf_anchor: LocalFrame,
    pub angle_count: usize,
}

/// Quantized frame
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedFrame {
    pub header: FrameHeader,
    pub codes: Vec<i8>,
}

impl CompressedFrame {
    /// Delta angles recovered from the codes
    pub fn dequantize(&self) -> Result<DeltaAngles> {
        if self.codes.len() != self.header.angle_count {
            return Err(Error::InvalidData(format!(
                "header announces {} angles but {} codes are present",
                self.header.angle_count,
                self.codes.len()
            )));
        }
        let quantizer = Quantizer::new(self.header.bits)?;
        Ok(DeltaAngles {
            root_face: self.header.root_face,
            leaf_face: self.header.leaf_face,
            root_anchor: self.header.root_anchor,
            leaf_anchor: self.header.leaf_anchor,
            deltas: quantizer.dequantize(&self.codes, &self.header.range),
        })
    }
}

/// Encoder and decoder bound to a rest mesh and root face
#[derive(Debug, Clone)]
pub struct AnimationCodec {
    rest: TriangleMesh,
    graph: DualGraph,
    tree: SpanningTree,
    walk: TreeWalk,
    leaf_face: usize,
    decoder: DiffusionDecoder,
    solver: LinearSolverKind,
}

impl AnimationCodec {
    /// Build the codec for `rest`, rooting the tree walk at `root_face`.
    ///
    /// The leaf face is the face farthest from the root in the dual graph.
    pub fn new(rest: TriangleMesh, root_face: usize) -> Result<Self> {
        Self::with_dot_dir(rest, root_face, None)
    }

    /// Like [`AnimationCodec::new`], also writing `dual_graph.dot` and
    /// `spanning_tree.dot` into `dot_dir`
    pub fn with_dot_dir(rest: TriangleMesh, root_face: usize, dot_dir: Option<&Path>) -> Result<Self> {
        rest.validate()?;
        if rest.is_empty() {
            return Err(Error::InvalidData("rest mesh has no faces".to_string()));
        }
        let dual_dot = dot_dir.map(|d| d.join("dual_graph.dot"));
        let tree_dot = dot_dir.map(|d| d.join("spanning_tree.dot"));

        let (_, graph) = build_dual_graph(&rest.faces, dual_dot.as_deref())?;
        let tree = minimum_spanning_tree(&graph, tree_dot.as_deref())?;
        let walk = TreeWalk::new(&tree, &rest.faces, root_face)?;
        let leaf_face = farthest_node(&graph, root_face)?;
        let decoder = DiffusionDecoder::new(&rest)?;

        info!(
            "codec ready: {} faces, {} tree arcs, root face {}, leaf face {}",
            rest.face_count(),
            walk.len(),
            root_face,
            leaf_face
        );
        Ok(Self {
            rest,
            graph,
            tree,
            walk,
            leaf_face,
            decoder,
            solver: LinearSolverKind::default(),
        })
    }

    /// Use `solver` for the position solve
    pub fn with_solver(mut self, solver: LinearSolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Switch the edge weights of the position solve
    pub fn with_weighting(mut self, weighting: EdgeWeighting) -> Result<Self> {
        self.decoder = DiffusionDecoder::with_weighting(&self.rest, weighting)?;
        Ok(self)
    }

    pub fn with_cg_config(mut self, cg: CgConfig) -> Self {
        self.decoder = self.decoder.with_cg_config(cg);
        self
    }

    pub fn rest(&self) -> &TriangleMesh {
        &self.rest
    }

    pub fn graph(&self) -> &DualGraph {
        &self.graph
    }

    pub fn tree(&self) -> &SpanningTree {
        &self.tree
    }

    pub fn walk(&self) -> &TreeWalk {
        &self.walk
    }

    pub fn root_face(&self) -> usize {
        self.walk.root()
    }

    pub fn leaf_face(&self) -> usize {
        self.leaf_face
    }

    pub fn solver(&self) -> LinearSolverKind {
        self.solver
    }

    /// Delta angles of the motion from `prev` to `curr`
    pub fn encode(&self, prev: &[Point3d], curr: &[Point3d]) -> Result<DeltaAngles> {
        self.check_frame(prev, "previous")?;
        self.check_frame(curr, "current")?;
        DiffusionEncoder::new().encode_along(&self.rest.faces, prev, curr, &self.walk, self.leaf_face)
    }

    /// Reconstruct the current frame from `prev` and its delta angles.
    ///
    /// The root face's corners are pinned where the root anchor places the
    /// rest triangle, which fixes the rigid motion of the solve.
    pub fn decode(&self, prev: &[Point3d], angles: &DeltaAngles) -> Result<Reconstruction> {
        self.decode_with_pins(prev, angles, &[])
    }

    /// Like [`AnimationCodec::decode`] with extra vertices pinned to known positions
    pub fn decode_with_pins(
        &self,
        prev: &[Point3d],
        angles: &DeltaAngles,
        pins: &[(usize, Point3d)],
    ) -> Result<Reconstruction> {
        self.check_frame(prev, "previous")?;
        if angles.root_face != self.root_face() {
            return Err(Error::InvalidData(format!(
                "angles were encoded from root face {}, codec uses {}",
                angles.root_face,
                self.root_face()
            )));
        }

        let mut decoder = self.decoder.clone();
        decoder.clear_pins();
        decoder.pin_face_to_frame(angles.root_face, &angles.root_anchor)?;
        for &(v, p) in pins {
            decoder.pin_vertex(v, p)?;
        }
        decoder.estimate_rotation_along(prev, &self.walk, &angles.root_anchor, &angles.deltas)?;
        let leaf_drift = decoder.leaf_drift(angles.leaf_face, &angles.leaf_anchor)?;
        let positions = decoder.solve(self.solver)?;

        let reconstruction = Reconstruction { positions, leaf_drift };
        reconstruction.log();
        Ok(reconstruction)
    }

    /// Encode and quantize the motion from `prev` to `curr`
    pub fn compress(&self, prev: &[Point3d], curr: &[Point3d], bits: u32) -> Result<CompressedFrame> {
        let quantizer = Quantizer::new(bits)?;
        let angles = self.encode(prev, curr)?;
        Self::quantize(&angles, &quantizer)
    }

    /// Quantize already encoded angles
    pub fn quantize(angles: &DeltaAngles, quantizer: &Quantizer) -> Result<CompressedFrame> {
        let range = if angles.deltas.is_empty() {
            ValueRange::new(0.0, 0.0)?
        } else {
            ValueRange::of(&angles.deltas)?
        };
        let codes = quantizer.quantize(&angles.deltas, &range);
        debug!(
            "quantized {} angles to {} bits, max error {:.3e}",
            codes.len(),
            quantizer.bits(),
            quantizer.max_error(&range)
        );
        Ok(CompressedFrame {
            header: FrameHeader {
                bits: quantizer.bits(),
                range,
                root_face: angles.root_face,
                leaf_face: angles.leaf_face,
                root_anchor: angles.root_anchor,
                leaf_anchor: angles.leaf_anchor,
                angle_count: codes.len(),
            },
            codes,
        })
    }

    /// Decode a quantized frame
    pub fn decompress(&self, prev: &[Point3d], frame: &CompressedFrame) -> Result<Reconstruction> {
        let angles = frame.dequantize()?;
        self.decode(prev, &angles)
    }

    fn check_frame(&self, positions: &[Point3d], which: &str) -> Result<()> {
        if positions.len() != self.rest.vertex_count() {
            return Err(Error::InvalidData(format!(
                "{} frame has {} vertices, rest mesh has {}",
                which,
                positions.len(),
                self.rest.vertex_count()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn hinge() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
                Point3d::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [2, 1, 3]],
        )
    }

    fn fold(positions: &[Point3d], angle: f64) -> Vec<Point3d> {
        let origin = positions[1];
        let axis = nalgebra::Unit::new_normalize(positions[2] - positions[1]);
        let rot = nalgebra::Rotation3::from_axis_angle(&axis, angle);
        let mut out = positions.to_vec();
        out[3] = origin + rot * (positions[3] - origin);
        out
    }

    #[test]
    fn test_hinge_fold_round_trip() {
        let mesh = hinge();
        let codec = AnimationCodec::new(mesh.clone(), 0).unwrap();
        assert_eq!(codec.leaf_face(), 1);

        let curr = fold(&mesh.vertices, 0.6);
        let angles = codec.encode(&mesh.vertices, &curr).unwrap();
        let out = codec.decode(&mesh.vertices, &angles).unwrap();
        for (p, q) in out.positions.iter().zip(&curr) {
            assert_abs_diff_eq!(p, q, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(out.leaf_drift, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_compress_header_matches_angles() {
        let mesh = hinge();
        let codec = AnimationCodec::new(mesh.clone(), 1).unwrap();
        let curr = fold(&mesh.vertices, -0.3);
        let frame = codec.compress(&mesh.vertices, &curr, 8).unwrap();

        assert_eq!(frame.header.bits, 8);
        assert_eq!(frame.header.root_face, 1);
        assert_eq!(frame.header.leaf_face, 0);
        assert_eq!(frame.header.angle_count, 1);
        // a single angle makes a degenerate range: exact after dequantization
        let angles = frame.dequantize().unwrap();
        assert_abs_diff_eq!(angles.deltas[0], -0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_decode_rejects_foreign_root() {
        let mesh = hinge();
        let codec = AnimationCodec::new(mesh.clone(), 0).unwrap();
        let other = AnimationCodec::new(mesh.clone(), 1).unwrap();
        let angles = other.encode(&mesh.vertices, &mesh.vertices).unwrap();
        assert!(matches!(codec.decode(&mesh.vertices, &angles), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_code_count_must_match_header() {
        let mesh = hinge();
        let codec = AnimationCodec::new(mesh.clone(), 0).unwrap();
        let mut frame = codec.compress(&mesh.vertices, &mesh.vertices, 4).unwrap();
        frame.codes.push(0);
        assert!(codec.decompress(&mesh.vertices, &frame).is_err());
    }

    #[test]
    fn test_invalid_construction() {
        assert!(matches!(AnimationCodec::new(hinge(), 2), Err(Error::Range(_))));
        assert!(AnimationCodec::new(TriangleMesh::new(), 0).is_err());
        assert!(matches!(
            AnimationCodec::new(hinge(), 0).unwrap().compress(&hinge().vertices, &hinge().vertices, 9),
            Err(Error::Range(_))
        ));
    }
}
