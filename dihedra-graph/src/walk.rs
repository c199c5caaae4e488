//! Deterministic walk of a spanning tree from a root face.
//!
//! The walk is the protocol shared by the encoder and the decoder: arc `i`
//! of the walk carries delta angle `i`. It is a breadth-first traversal that
//! expands the children of every face in increasing face-index order, so the
//! sequence depends only on the tree and the root, never on arc insertion
//! order.

use crate::adjacency::shared_edge;
use crate::spanning_tree::SpanningTree;
use dihedra_core::{Error, Result};
use itertools::Itertools;
use std::collections::VecDeque;

/// One directed tree edge, oriented away from the root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeArc {
    pub parent: usize,
    pub child: usize,
    /// Mesh edge shared by both faces, oriented as in the parent's winding
    pub edge: [usize; 2],
}

/// Breadth-first order of a spanning tree rooted at one face
#[derive(Debug, Clone)]
pub struct TreeWalk {
    root: usize,
    arcs: Vec<TreeArc>,
}

impl TreeWalk {
    /// Walk `tree` from `root`.
    ///
    /// Fails with [`Error::Range`] if `root` is not a face, and with
    /// [`Error::Topology`] if the tree does not reach every face or joins
    /// two faces that share no mesh edge.
    pub fn new(tree: &SpanningTree, triangles: &[[usize; 3]], root: usize) -> Result<Self> {
        let n = tree.vertex_count();
        if n != triangles.len() {
            return Err(Error::Topology(format!(
                "tree spans {} faces but mesh has {}",
                n,
                triangles.len()
            )));
        }
        if root >= n {
            return Err(Error::Range(format!(
                "root face {} out of range for {} faces",
                root, n
            )));
        }

        let mut visited = vec![false; n];
        let mut queue = VecDeque::from([root]);
        let mut arcs = Vec::with_capacity(n.saturating_sub(1));
        visited[root] = true;

        while let Some(parent) = queue.pop_front() {
            for child in tree.neighbors(parent).sorted_unstable() {
                if visited[child] {
                    continue;
                }
                visited[child] = true;
                let edge = shared_edge(triangles, parent, child).ok_or_else(|| {
                    Error::Topology(format!(
                        "tree joins faces {} and {} which share no edge",
                        parent, child
                    ))
                })?;
                arcs.push(TreeArc { parent, child, edge });
                queue.push_back(child);
            }
        }

        if arcs.len() + 1 != n {
            return Err(Error::Topology(format!(
                "tree walk from face {} reached {} of {} faces",
                root,
                arcs.len() + 1,
                n
            )));
        }
        Ok(Self { root, arcs })
    }

    /// The root face
    #[inline]
    pub fn root(&self) -> usize {
        self.root
    }

    /// Arcs in walk order
    #[inline]
    pub fn arcs(&self) -> &[TreeArc] {
        &self.arcs
    }

    /// Number of arcs, i.e. of delta angles
    #[inline]
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Number of faces covered by the walk
    #[inline]
    pub fn face_count(&self) -> usize {
        self.arcs.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual_graph::build_dual_graph;
    use crate::fixtures::*;
    use crate::spanning_tree::minimum_spanning_tree;

    fn octahedron_tree() -> (Vec<[usize; 3]>, SpanningTree) {
        let faces = octahedron_faces();
        let (_, graph) = build_dual_graph(&faces, None).unwrap();
        let tree = minimum_spanning_tree(&graph, None).unwrap();
        (faces, tree)
    }

    #[test]
    fn test_walk_visits_every_face_once() {
        let (faces, tree) = octahedron_tree();
        let walk = TreeWalk::new(&tree, &faces, 3).unwrap();

        assert_eq!(walk.root(), 3);
        assert_eq!(walk.len(), 7);
        let mut seen = vec![false; 8];
        seen[3] = true;
        for arc in walk.arcs() {
            assert!(seen[arc.parent], "parent {} visited after child", arc.parent);
            assert!(!seen[arc.child]);
            seen[arc.child] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_children_expanded_in_increasing_order() {
        let (faces, tree) = octahedron_tree();
        let walk = TreeWalk::new(&tree, &faces, 0).unwrap();
        for pair in walk.arcs().windows(2) {
            if pair[0].parent == pair[1].parent {
                assert!(pair[0].child < pair[1].child);
            }
        }
    }

    #[test]
    fn test_walk_is_reproducible() {
        let (faces, tree) = octahedron_tree();
        let a = TreeWalk::new(&tree, &faces, 5).unwrap();
        let b = TreeWalk::new(&tree.clone(), &faces, 5).unwrap();
        assert_eq!(a.arcs(), b.arcs());
    }

    #[test]
    fn test_arc_edges_follow_parent_winding() {
        let (faces, tree) = octahedron_tree();
        let walk = TreeWalk::new(&tree, &faces, 0).unwrap();
        for arc in walk.arcs() {
            let p = faces[arc.parent];
            let k = p.iter().position(|&v| v == arc.edge[0]).unwrap();
            assert_eq!(p[(k + 1) % 3], arc.edge[1]);
            assert!(faces[arc.child].contains(&arc.edge[0]));
            assert!(faces[arc.child].contains(&arc.edge[1]));
        }
    }

    #[test]
    fn test_root_out_of_range() {
        let (faces, tree) = octahedron_tree();
        assert!(matches!(TreeWalk::new(&tree, &faces, 8), Err(Error::Range(_))));
    }

    #[test]
    fn test_tree_from_other_mesh_is_rejected() {
        let (_, tree) = octahedron_tree();
        let faces = grid_faces(1);
        assert!(matches!(TreeWalk::new(&tree, &faces, 0), Err(Error::Topology(_))));
    }
}
