//! Mesh I/O for dihedra
//!
//! This crate reads and writes triangle meshes as Wavefront OBJ and locates
//! the numbered frame files of an animation sequence on disk.

pub mod obj;
pub mod sequence;

pub use obj::{ObjReader, ObjWriter};
pub use sequence::*;

use dihedra_core::{Error, Point3d, Result, TriangleMesh};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}

/// Auto-detect format and read mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some("obj") => ObjReader::read_mesh(path),
        _ => Err(Error::InvalidData(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

/// Auto-detect format and write mesh
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some("obj") => ObjWriter::write_mesh(mesh, path),
        _ => Err(Error::InvalidData(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

/// Write `positions` with the connectivity of `faces`
pub fn write_positions<P: AsRef<Path>>(faces: &[[usize; 3]], positions: &[Point3d], path: P) -> Result<()> {
    let mesh = TriangleMesh::from_vertices_and_faces(positions.to_vec(), faces.to_vec());
    write_mesh(&mesh, path)
}

/// Read a frame and check that it shares the connectivity of `rest`
pub fn read_frame_positions<P: AsRef<Path>>(rest: &TriangleMesh, path: P) -> Result<Vec<Point3d>> {
    let path = path.as_ref();
    let frame = read_mesh(path)?;
    if !rest.same_topology(&frame) {
        return Err(Error::Topology(format!(
            "{} does not share the rest mesh connectivity ({} vertices, {} faces vs {} vertices, {} faces)",
            path.display(),
            frame.vertex_count(),
            frame.face_count(),
            rest.vertex_count(),
            rest.face_count()
        )));
    }
    Ok(frame.vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_auto_detect_functions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("triangle.obj");
        write_mesh(&triangle(), &path).unwrap();
        let loaded = read_mesh(&path).unwrap();
        assert_eq!(loaded.faces, vec![[0, 1, 2]]);
        assert_eq!(loaded.vertices, triangle().vertices);
    }

    #[test]
    fn test_unsupported_format() {
        assert!(read_mesh("mesh.ply").is_err());
        assert!(write_mesh(&triangle(), "mesh.stl").is_err());
    }

    #[test]
    fn test_frame_must_share_topology() {
        let dir = tempdir().unwrap();
        let rest_path = dir.path().join("rest.obj");
        let frame_path = dir.path().join("frame.obj");

        let rest = triangle();
        write_positions(&rest.faces, &[
            Point3d::new(0.0, 0.0, 1.0),
            Point3d::new(1.0, 0.0, 1.0),
            Point3d::new(0.0, 1.0, 1.0),
        ], &frame_path)
        .unwrap();
        let positions = read_frame_positions(&rest, &frame_path).unwrap();
        assert_eq!(positions[2], Point3d::new(0.0, 1.0, 1.0));

        write_positions(&[[0, 2, 1]], &rest.vertices, &rest_path).unwrap();
        assert!(matches!(read_frame_positions(&rest, &rest_path), Err(Error::Topology(_))));
    }
}
