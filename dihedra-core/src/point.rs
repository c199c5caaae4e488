//! Point and vector aliases

use nalgebra::{Point2, Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// A 2D point in a face's tangent plane
pub type Point2d = Point2<f64>;

/// Centroid of three points
#[inline]
pub fn centroid(a: &Point3d, b: &Point3d, c: &Point3d) -> Point3d {
    Point3d::from((a.coords + b.coords + c.coords) / 3.0)
}
