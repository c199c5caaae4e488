//! Per-face local frames and related triangle geometry
//!
//! Each triangle carries an orthonormal frame: the origin is the centroid,
//! `x` follows the first edge `v1 - v0`, `z` is the unit normal of the
//! counter-clockwise winding and `y = z × x`. The encoder compares these
//! frames between animation frames; the decoder rotates them back into place.
//!
//! All per-face kernels run on rayon parallel iterators. Every face writes
//! only its own output slot, so no synchronization is needed beyond the join.

use crate::error::{Error, Result};
use crate::point::*;
use nalgebra::{Matrix3, Rotation3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Orthonormal frame attached to a triangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalFrame {
    /// Triangle centroid
    pub origin: Point3d,
    /// Columns are the frame's x, y and z axes in world coordinates
    pub axes: Rotation3<f64>,
}

impl LocalFrame {
    /// Build the frame of triangle `(a, b, c)`, or `None` if it has no area
    pub fn from_triangle(a: &Point3d, b: &Point3d, c: &Point3d) -> Option<Self> {
        let e0 = b - a;
        let e1 = c - b;
        let normal = e0.cross(&e1);
        let scale = e0.norm() * e1.norm();
        if scale == 0.0 || normal.norm() <= f64::EPSILON * scale {
            return None;
        }
        let x = e0.normalize();
        let z = normal.normalize();
        let y = z.cross(&x);
        Some(Self {
            origin: centroid(a, b, c),
            axes: Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z])),
        })
    }

    /// The frame's unit normal (z axis)
    #[inline]
    pub fn normal(&self) -> Vector3d {
        self.axes.matrix().column(2).into_owned()
    }

    /// Express a world point in this frame's tangent plane
    #[inline]
    pub fn to_local_uv(&self, p: &Point3d) -> Point2d {
        let d = self.axes.inverse_transform_vector(&(p - self.origin));
        Point2d::new(d.x, d.y)
    }

    /// Angle of the rotation taking this frame's axes onto `other`'s
    pub fn angle_to(&self, other: &LocalFrame) -> f64 {
        self.axes.rotation_to(&other.axes).angle()
    }
}

/// Frame of a single face, failing on degenerate triangles
pub fn face_local_frame(faces: &[[usize; 3]], positions: &[Point3d], face: usize) -> Result<LocalFrame> {
    let [a, b, c] = *faces
        .get(face)
        .ok_or_else(|| Error::Range(format!("face {} out of range for {} faces", face, faces.len())))?;
    let corner = |v: usize| {
        positions.get(v).ok_or_else(|| {
            Error::Range(format!(
                "face {} references vertex {} but the frame has {} vertices",
                face,
                v,
                positions.len()
            ))
        })
    };
    LocalFrame::from_triangle(corner(a)?, corner(b)?, corner(c)?)
        .ok_or_else(|| Error::InvalidData(format!("face {} is degenerate (zero area)", face)))
}

/// Local frames of all faces
pub fn face_local_frames(faces: &[[usize; 3]], positions: &[Point3d]) -> Result<Vec<LocalFrame>> {
    (0..faces.len())
        .into_par_iter()
        .map(|fi| face_local_frame(faces, positions, fi))
        .collect()
}

/// Tangent-plane coordinates of every face corner in its own frame
pub fn local_uv(faces: &[[usize; 3]], positions: &[Point3d], frames: &[LocalFrame]) -> Vec<[Point2d; 3]> {
    faces
        .par_iter()
        .zip(frames.par_iter())
        .map(|(face, frame)| {
            [
                frame.to_local_uv(&positions[face[0]]),
                frame.to_local_uv(&positions[face[1]]),
                frame.to_local_uv(&positions[face[2]]),
            ]
        })
        .collect()
}

/// Cotangent of the interior angle at each corner
///
/// Entry `k` belongs to the corner at `face[k]`, i.e. it is opposite the edge
/// `(face[k + 1], face[k + 2])`.
pub fn cotangent_values(faces: &[[usize; 3]], positions: &[Point3d]) -> Vec<[f64; 3]> {
    faces
        .par_iter()
        .map(|face| {
            let mut cot = [0.0; 3];
            for k in 0..3 {
                let apex = positions[face[k]];
                let u = positions[face[(k + 1) % 3]] - apex;
                let v = positions[face[(k + 2) % 3]] - apex;
                let sin = u.cross(&v).norm();
                cot[k] = if sin > 0.0 { u.dot(&v) / sin } else { 0.0 };
            }
            cot
        })
        .collect()
}

/// Faces incident to each vertex
pub fn one_ring_faces(faces: &[[usize; 3]], vertex_count: usize) -> Vec<Vec<usize>> {
    let mut ring = vec![Vec::new(); vertex_count];
    for (fi, face) in faces.iter().enumerate() {
        for &v in face {
            ring[v].push(fi);
        }
    }
    ring
}
