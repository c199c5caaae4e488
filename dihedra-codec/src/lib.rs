//! Delta dihedral angle codec for animated triangle meshes
//!
//! A frame is encoded relative to its predecessor as one signed angle change
//! per spanning tree arc of the face dual graph, plus the local frames of a
//! root face and a leaf face. Decoding integrates the angles back into face
//! rotations along the same tree walk and solves a sparse linear system for
//! the vertex positions.
//!
//! - [`encoder`]: frame pairs to delta angles
//! - [`quantize`]: delta angles to fixed-width codes and back
//! - [`decoder`]: rotation estimation and the global position solve
//! - [`solver`]: Cholesky, LU and conjugate gradient backends
//! - [`codec`]: the per-mesh [`AnimationCodec`] tying the stages together
//! - [`storage`]: code, angle and header files

pub mod encoder;
pub mod quantize;
pub mod decoder;
pub mod solver;
pub mod codec;
pub mod storage;

pub use encoder::*;
pub use quantize::*;
pub use decoder::*;
pub use solver::*;
pub use codec::*;
pub use storage::*;
