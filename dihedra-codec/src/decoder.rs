//! Diffusion decoder
//!
//! Rebuilds a frame from delta angles in two steps. First the rotation of
//! every face is integrated along the tree walk, starting from the root
//! anchor: each child turns relative to its parent by its previous relative
//! rotation, hinged about the shared edge by the delta angle. Then vertex
//! positions are solved globally so that every triangle's edges match its
//! rest shape under the estimated rotation, with pinned vertices held fixed.

use crate::solver::{assemble, solve, CgConfig, LinearSolverKind};
use dihedra_core::{
    cotangent_values, face_local_frames, local_uv, one_ring_faces, Error, LocalFrame, Point2d,
    Point3d, Result, TriangleMesh, Vector3d,
};
use dihedra_graph::{SpanningTree, TreeWalk};
use nalgebra::{DMatrix, Rotation3, Unit};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Smallest weight a cotangent edge may carry
const MIN_COTANGENT_WEIGHT: f64 = 1e-3;

/// Edge weights of the position energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeWeighting {
    #[default]
    Uniform,
    /// Half the cotangent of the opposite angle, clamped positive
    Cotangent,
}

/// Decoder bound to one rest mesh
#[derive(Debug, Clone)]
pub struct DiffusionDecoder {
    triangles: Vec<[usize; 3]>,
    vertex_count: usize,
    /// Rest corner coordinates in each face's own frame
    rest_uv: Vec<[Point2d; 3]>,
    /// Weight of edge `(face[k], face[k + 1])` at index `k`
    weights: Vec<[f64; 3]>,
    pins: BTreeMap<usize, Point3d>,
    /// Estimated face frames of the frame being decoded
    rotations: Vec<Rotation3<f64>>,
    cg: CgConfig,
}

impl DiffusionDecoder {
    /// Decoder with uniform edge weights
    pub fn new(rest: &TriangleMesh) -> Result<Self> {
        Self::with_weighting(rest, EdgeWeighting::Uniform)
    }

    pub fn with_weighting(rest: &TriangleMesh, weighting: EdgeWeighting) -> Result<Self> {
        rest.validate()?;
        let frames = face_local_frames(&rest.faces, &rest.vertices)?;
        let rest_uv = local_uv(&rest.faces, &rest.vertices, &frames);
        let weights = match weighting {
            EdgeWeighting::Uniform => vec![[1.0; 3]; rest.face_count()],
            EdgeWeighting::Cotangent => cotangent_values(&rest.faces, &rest.vertices)
                .into_iter()
                .map(|cot| {
                    let w = |k: usize| (0.5 * cot[(k + 2) % 3]).max(MIN_COTANGENT_WEIGHT);
                    [w(0), w(1), w(2)]
                })
                .collect(),
        };
        Ok(Self {
            triangles: rest.faces.clone(),
            vertex_count: rest.vertex_count(),
            rest_uv,
            weights,
            pins: BTreeMap::new(),
            rotations: Vec::new(),
            cg: CgConfig::default(),
        })
    }

    /// Replace the conjugate gradient stopping rule
    pub fn with_cg_config(mut self, cg: CgConfig) -> Self {
        self.cg = cg;
        self
    }

    /// Fix the output position of a vertex
    pub fn pin_vertex(&mut self, index: usize, position: Point3d) -> Result<()> {
        if index >= self.vertex_count {
            return Err(Error::Range(format!(
                "cannot pin vertex {}: mesh has {} vertices",
                index, self.vertex_count
            )));
        }
        if !position.iter().all(|c| c.is_finite()) {
            return Err(Error::InvalidData(format!("pin position of vertex {} is not finite", index)));
        }
        self.pins.insert(index, position);
        Ok(())
    }

    /// Pin the corners of `face` where its rest shape lands under `frame`
    pub fn pin_face_to_frame(&mut self, face: usize, frame: &LocalFrame) -> Result<()> {
        if face >= self.triangles.len() {
            return Err(Error::Range(format!(
                "cannot pin face {}: mesh has {} faces",
                face,
                self.triangles.len()
            )));
        }
        let corners = self.triangles[face];
        for (k, &v) in corners.iter().enumerate() {
            let uv = self.rest_uv[face][k];
            let position = frame.origin + frame.axes * Vector3d::new(uv.x, uv.y, 0.0);
            self.pin_vertex(v, position)?;
        }
        Ok(())
    }

    /// Remove all pins
    pub fn clear_pins(&mut self) {
        self.pins.clear();
    }

    /// Currently pinned vertices
    pub fn pinned(&self) -> &BTreeMap<usize, Point3d> {
        &self.pins
    }

    /// Estimated face frames from the last rotation estimate
    pub fn rotations(&self) -> &[Rotation3<f64>] {
        &self.rotations
    }

    /// Integrate `deltas` along the walk of `tree` from `root_face`
    pub fn estimate_rotation(
        &mut self,
        prev: &[Point3d],
        tree: &SpanningTree,
        root_face: usize,
        root_anchor: &LocalFrame,
        deltas: &[f64],
    ) -> Result<&[Rotation3<f64>]> {
        let walk = TreeWalk::new(tree, &self.triangles, root_face)?;
        self.estimate_rotation_along(prev, &walk, root_anchor, deltas)
    }

    /// Integrate `deltas` along a precomputed walk.
    ///
    /// The root face takes the anchor's axes. Every other face is composed as
    /// `parent * relative`, where `relative` is the child's previous frame
    /// seen from its parent's previous frame after hinging the child about
    /// the shared edge by its delta.
    pub fn estimate_rotation_along(
        &mut self,
        prev: &[Point3d],
        walk: &TreeWalk,
        root_anchor: &LocalFrame,
        deltas: &[f64],
    ) -> Result<&[Rotation3<f64>]> {
        if prev.len() != self.vertex_count {
            return Err(Error::InvalidData(format!(
                "previous frame has {} vertices, rest mesh has {}",
                prev.len(),
                self.vertex_count
            )));
        }
        if walk.face_count() != self.triangles.len() {
            return Err(Error::Topology(format!(
                "walk covers {} faces but mesh has {}",
                walk.face_count(),
                self.triangles.len()
            )));
        }
        if deltas.len() != walk.len() {
            return Err(Error::InvalidData(format!(
                "{} delta angles for {} tree arcs",
                deltas.len(),
                walk.len()
            )));
        }

        let frames_prev = face_local_frames(&self.triangles, prev)?;
        let mut rotations = vec![Rotation3::identity(); self.triangles.len()];
        rotations[walk.root()] = root_anchor.axes;

        for (arc, &delta) in walk.arcs().iter().zip(deltas) {
            let axis = Unit::new_normalize(prev[arc.edge[1]] - prev[arc.edge[0]]);
            let hinge = Rotation3::from_axis_angle(&axis, delta);
            let relative = frames_prev[arc.parent].axes.inverse() * hinge * frames_prev[arc.child].axes;
            rotations[arc.child] = rotations[arc.parent] * relative;
        }

        self.rotations = rotations;
        Ok(&self.rotations)
    }

    /// Angle between the estimated leaf frame and its recorded anchor
    pub fn leaf_drift(&self, leaf_face: usize, leaf_anchor: &LocalFrame) -> Result<f64> {
        let estimated = self.rotations.get(leaf_face).ok_or_else(|| {
            Error::Range(format!(
                "no rotation estimate for leaf face {} ({} estimated)",
                leaf_face,
                self.rotations.len()
            ))
        })?;
        Ok(estimated.rotation_to(&leaf_anchor.axes).angle())
    }

    /// Solve with a backend chosen by name
    pub fn solve_named(&self, solver: &str) -> Result<Vec<Point3d>> {
        self.solve(solver.parse()?)
    }

    /// Solve the global position system.
    ///
    /// Minimizes `sum w_ij |x_i - x_j - R_f (u_i - u_j)|^2` over all face
    /// edges with pinned vertices held fixed. Fails with
    /// [`Error::SingularSystem`] when nothing is pinned, when some free vertex
    /// is not connected to a pinned one, or when the backend fails.
    pub fn solve(&self, kind: LinearSolverKind) -> Result<Vec<Point3d>> {
        if self.rotations.len() != self.triangles.len() {
            return Err(Error::InvalidData(
                "rotations must be estimated before solving".to_string(),
            ));
        }
        self.check_pinning()?;

        let mut column = vec![None; self.vertex_count];
        let mut free = 0;
        for (v, slot) in column.iter_mut().enumerate() {
            if !self.pins.contains_key(&v) {
                *slot = Some(free);
                free += 1;
            }
        }

        let mut positions: Vec<Point3d> = (0..self.vertex_count)
            .map(|v| self.pins.get(&v).copied().unwrap_or_else(Point3d::origin))
            .collect();
        if free == 0 {
            return Ok(positions);
        }

        let mut triplets = Vec::with_capacity(self.triangles.len() * 12);
        let mut rhs = DMatrix::zeros(free, 3);
        let mut add_rhs = |row: usize, value: Vector3d| {
            for c in 0..3 {
                rhs[(row, c)] += value[c];
            }
        };

        for (f, face) in self.triangles.iter().enumerate() {
            let rotation = &self.rotations[f];
            for k in 0..3 {
                let (a, b) = (k, (k + 1) % 3);
                let (i, j) = (face[a], face[b]);
                let w = self.weights[f][k];
                let local = self.rest_uv[f][a] - self.rest_uv[f][b];
                let target = rotation * Vector3d::new(local.x, local.y, 0.0);

                // gradient of w |x_i - x_j - target|^2 in x_i, then in x_j
                match (column[i], column[j]) {
                    (Some(ci), Some(cj)) => {
                        triplets.extend([(ci, ci, w), (ci, cj, -w), (cj, cj, w), (cj, ci, -w)]);
                        add_rhs(ci, w * target);
                        add_rhs(cj, -w * target);
                    }
                    (Some(ci), None) => {
                        triplets.push((ci, ci, w));
                        add_rhs(ci, w * (target + self.pins[&j].coords));
                    }
                    (None, Some(cj)) => {
                        triplets.push((cj, cj, w));
                        add_rhs(cj, w * (self.pins[&i].coords - target));
                    }
                    (None, None) => {}
                }
            }
        }

        let matrix = assemble(free, &triplets)?;
        let solution = solve(kind, &matrix, &rhs, &self.cg)?;

        for (v, slot) in column.iter().enumerate() {
            if let Some(row) = *slot {
                positions[v] = Point3d::new(solution[(row, 0)], solution[(row, 1)], solution[(row, 2)]);
            }
        }
        debug!("solved {} free vertices with {} pinned", free, self.pins.len());
        Ok(positions)
    }

    /// Every free vertex must reach a pinned one through mesh edges
    fn check_pinning(&self) -> Result<()> {
        if self.pins.is_empty() {
            return Err(Error::SingularSystem(
                "no vertex is pinned; rigid translation is undetermined".to_string(),
            ));
        }
        let ring = one_ring_faces(&self.triangles, self.vertex_count);
        let mut reached = vec![false; self.vertex_count];
        let mut stack: Vec<usize> = self.pins.keys().copied().collect();
        for &v in &stack {
            reached[v] = true;
        }
        while let Some(v) = stack.pop() {
            for &w in ring[v].iter().flat_map(|&f| &self.triangles[f]) {
                if !reached[w] {
                    reached[w] = true;
                    stack.push(w);
                }
            }
        }
        match reached.iter().position(|&r| !r) {
            Some(v) => Err(Error::SingularSystem(format!(
                "vertex {} is not connected to any pinned vertex",
                v
            ))),
            None => Ok(()),
        }
    }
}

/// Decoded frame with its drift diagnostic
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub positions: Vec<Point3d>,
    /// Angle between the estimated and the recorded leaf frame
    pub leaf_drift: f64,
}

impl Reconstruction {
    pub(crate) fn log(&self) {
        info!("leaf drift: {:.3e} rad", self.leaf_drift);
    }
}
