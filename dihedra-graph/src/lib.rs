//! Face adjacency graphs for dihedra
//!
//! This crate turns a triangle list into its dual graph (one vertex per face,
//! one edge per interior mesh edge), extracts a minimum spanning tree from it,
//! and fixes the deterministic walk order that the encoder and decoder share.

pub mod adjacency;
pub mod dual_graph;
pub mod spanning_tree;
pub mod walk;
pub mod shortest_path;
pub mod export;

pub use adjacency::*;
pub use dual_graph::*;
pub use spanning_tree::*;
pub use walk::*;
pub use shortest_path::*;
pub use export::*;
