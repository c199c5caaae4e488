//! Core data structures for dihedra
//!
//! This crate provides the triangle mesh type shared by every stage of the
//! animation codec, the common error type, and the per-face local frame
//! geometry consumed by the encoder and decoder.

pub mod point;
pub mod mesh;
pub mod frame;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use frame::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3, Rotation3, Unit};
