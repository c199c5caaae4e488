//! OBJ format support
//!
//! Only geometry is read: `v` records give positions and `f` records give
//! polygons, which are fan-triangulated. Texture and normal references in a
//! face (`v/vt/vn`) are ignored, and negative indices count back from the
//! last vertex defined so far. Every other record is skipped.

use crate::{MeshReader, MeshWriter};
use dihedra_core::{Error, Point3d, Result, TriangleMesh};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub struct ObjReader;
pub struct ObjWriter;

impl ObjReader {
    /// Read OBJ data from a reader; `source` names it in parse errors
    pub fn read_obj_data<R: BufRead>(reader: &mut R, source: &str) -> Result<TriangleMesh> {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        let mut line = String::new();
        let mut line_number = 0;

        let parse_error = |line: usize, message: String| Error::Parse {
            path: source.to_string(),
            line,
            message,
        };

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_number += 1;

            let content = line.split('#').next().unwrap_or("").trim();
            let mut parts = content.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let coords: Vec<f64> = parts
                        .take(3)
                        .map(|s| {
                            s.parse::<f64>()
                                .map_err(|_| parse_error(line_number, format!("Invalid vertex coordinate: {}", s)))
                        })
                        .collect::<Result<_>>()?;
                    if coords.len() < 3 {
                        return Err(parse_error(line_number, "Vertex needs 3 coordinates".to_string()));
                    }
                    vertices.push(Point3d::new(coords[0], coords[1], coords[2]));
                }
                Some("f") => {
                    let corners: Vec<usize> = parts
                        .map(|token| Self::resolve_index(token, vertices.len()).map_err(|m| parse_error(line_number, m)))
                        .collect::<Result<_>>()?;
                    if corners.len() < 3 {
                        return Err(parse_error(
                            line_number,
                            format!("Face needs at least 3 vertices, found {}", corners.len()),
                        ));
                    }
                    for k in 1..corners.len() - 1 {
                        faces.push([corners[0], corners[k], corners[k + 1]]);
                    }
                }
                _ => {}
            }
        }

        debug!("read {} vertices and {} triangles from {}", vertices.len(), faces.len(), source);
        Ok(TriangleMesh::from_vertices_and_faces(vertices, faces))
    }

    /// Zero-based vertex index of a face token such as `7`, `7/2/7` or `-1//3`
    fn resolve_index(token: &str, defined: usize) -> std::result::Result<usize, String> {
        let head = token.split('/').next().unwrap_or("");
        let raw: i64 = head
            .parse()
            .map_err(|_| format!("Invalid face index: {}", token))?;
        let index = match raw {
            0 => return Err("Face index 0 is not valid in OBJ".to_string()),
            r if r > 0 => (r - 1) as usize,
            r => {
                let back = r.unsigned_abs() as usize;
                if back > defined {
                    return Err(format!("Relative face index {} precedes the first vertex", r));
                }
                defined - back
            }
        };
        if index >= defined {
            return Err(format!(
                "Face index {} refers to an undefined vertex ({} defined)",
                raw, defined
            ));
        }
        Ok(index)
    }
}

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_obj_data(&mut reader, &path.display().to_string())
    }
}

impl ObjWriter {
    /// Write OBJ data to a writer
    pub fn write_obj_data<W: Write>(writer: &mut W, mesh: &TriangleMesh) -> Result<()> {
        writeln!(writer, "# dihedra")?;
        for v in &mesh.vertices {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for f in &mesh.faces {
            writeln!(writer, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
        }
        Ok(())
    }
}

impl MeshWriter for ObjWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        mesh.validate()?;
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        Self::write_obj_data(&mut writer, mesh)?;
        writer.flush()?;
        debug!("wrote {} vertices to {}", mesh.vertex_count(), path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<TriangleMesh> {
        ObjReader::read_obj_data(&mut Cursor::new(text), "test.obj")
    }

    #[test]
    fn test_read_triangles() {
        let mesh = parse(
            "# a square\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvn 0 0 1\nf 1 2 3\nf 1 3 4\n",
        )
        .unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_polygons_are_fan_triangulated() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv -1 1 0\nf 1 2 3 4 5\n").unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);
    }

    #[test]
    fn test_slashed_and_relative_indices() {
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1/1 2//1 -1\n").unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        match parse("v 0 0 0\nv 1 x 0\n") {
            Err(Error::Parse { path, line, .. }) => {
                assert_eq!(path, "test.obj");
                assert_eq!(line, 2);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(matches!(parse("v 0 0 0\nv 1 0 0\nf 1 2\n"), Err(Error::Parse { line: 3, .. })));
        assert!(matches!(parse("v 0 0 0\nf 1 2 3\n"), Err(Error::Parse { .. })));
        assert!(matches!(parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n"), Err(Error::Parse { .. })));
        assert!(matches!(parse("v 0 0\n"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_write_then_read_keeps_full_precision() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3d::new(0.1, 1.0 / 3.0, -2.5e-7),
                Point3d::new(std::f64::consts::PI, 0.0, 1e10),
                Point3d::new(-0.7, 0.2, 0.3),
            ],
            vec![[0, 1, 2]],
        );
        let mut buffer = Vec::new();
        ObjWriter::write_obj_data(&mut buffer, &mesh).unwrap();
        let back = parse(std::str::from_utf8(&buffer).unwrap()).unwrap();
        assert_eq!(back.vertices, mesh.vertices);
        assert_eq!(back.faces, mesh.faces);
    }
}
