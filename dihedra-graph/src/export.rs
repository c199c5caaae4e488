//! Diagnostic exporters for graphs and trees.
//!
//! Write-only dumps for inspection in Graphviz and ParaView; nothing here is
//! ever read back.

use crate::spanning_tree::SpanningTree;
use dihedra_core::{centroid, Error, Point3d, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// VTK cell type of a two-point line segment
const VTK_LINE: u8 = 3;

/// Write an undirected graph in Graphviz dot format
pub fn write_graphviz<W, I>(mut writer: W, vertex_count: usize, edges: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (usize, usize)>,
{
    writeln!(writer, "graph G {{")?;
    for v in 0..vertex_count {
        writeln!(writer, "{};", v)?;
    }
    for (u, v) in edges {
        writeln!(writer, "{}--{} ;", u, v)?;
    }
    writeln!(writer, "}}")?;
    writer.flush()?;
    Ok(())
}

/// Draw the spanning tree as line segments between face centroids.
///
/// Emits a legacy ASCII VTK unstructured grid with one point per face and one
/// line cell per tree edge.
pub fn write_tree_vtk<W: Write>(
    mut writer: W,
    triangles: &[[usize; 3]],
    positions: &[Point3d],
    tree: &SpanningTree,
) -> Result<()> {
    if tree.vertex_count() != triangles.len() {
        return Err(Error::Topology(format!(
            "tree spans {} faces but mesh has {}",
            tree.vertex_count(),
            triangles.len()
        )));
    }
    let segments: Vec<(usize, usize)> = tree.edges().collect();
    if segments.len() + 1 != triangles.len() {
        return Err(Error::Topology(format!(
            "tree has {} edges, expected {}",
            segments.len(),
            triangles.len().saturating_sub(1)
        )));
    }

    writeln!(writer, "# vtk DataFile Version 2.0")?;
    writeln!(writer, "spanning tree of the dual graph")?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;

    writeln!(writer, "POINTS {} double", triangles.len())?;
    for &[a, b, c] in triangles {
        let p = centroid(&positions[a], &positions[b], &positions[c]);
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }

    writeln!(writer, "CELLS {} {}", segments.len(), segments.len() * 3)?;
    for (p, q) in &segments {
        writeln!(writer, "2 {} {}", p, q)?;
    }
    writeln!(writer, "CELL_TYPES {}", segments.len())?;
    for _ in &segments {
        writeln!(writer, "{}", VTK_LINE)?;
    }
    writer.flush()?;
    Ok(())
}

/// [`write_tree_vtk`] into a file
pub fn draw_spanning_tree<P: AsRef<Path>>(
    path: P,
    triangles: &[[usize; 3]],
    positions: &[Point3d],
    tree: &SpanningTree,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_tree_vtk(BufWriter::new(file), triangles, positions, tree)
}
