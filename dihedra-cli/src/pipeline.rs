//! Command implementations

use crate::config::CompressionConfig;
use anyhow::{bail, Context, Result};
use dihedra_codec::{
    read_frame, write_data_binary, write_data_text, write_frame, AnimationCodec, LinearSolverKind,
};
use dihedra_core::Point3d;
use dihedra_graph::draw_spanning_tree;
use dihedra_io::{
    discover_frames, frame_output_stem, read_frame_positions, read_mesh, rest_path, write_positions,
};
use std::fs;
use std::path::Path;
use tracing::info;

fn max_distance(a: &[Point3d], b: &[Point3d]) -> f64 {
    a.iter().zip(b).map(|(p, q)| (p - q).norm()).fold(0.0, f64::max)
}

/// Encode `mesh_prev -> mesh_curr`, then decode it unquantized and quantized
pub fn compress(config_path: &Path, dot_dir: Option<&Path>) -> Result<()> {
    let config = CompressionConfig::load(config_path)?;
    let quantizer = config.quantizer()?;
    let solver = config.solver()?;

    let rest = read_mesh(&config.mesh_rest)
        .with_context(|| format!("Failed to load rest mesh {}", config.mesh_rest.display()))?;
    if config.root_face >= rest.face_count() {
        bail!(
            "root face {} out of range: {} has {} faces",
            config.root_face,
            config.mesh_rest.display(),
            rest.face_count()
        );
    }
    let prev = read_frame_positions(&rest, &config.mesh_prev)
        .with_context(|| format!("Failed to load previous frame {}", config.mesh_prev.display()))?;
    let curr = read_frame_positions(&rest, &config.mesh_curr)
        .with_context(|| format!("Failed to load current frame {}", config.mesh_curr.display()))?;

    let outdir = &config.outdir;
    fs::create_dir_all(outdir).with_context(|| format!("Failed to create {}", outdir.display()))?;
    if let Some(dir) = dot_dir {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    write_positions(&rest.faces, &curr, outdir.join("tri_ground_truth.obj"))
        .context("Failed to write ground truth")?;

    let codec = AnimationCodec::with_dot_dir(rest, config.root_face, dot_dir)
        .context("Failed to build dual graph and spanning tree")?
        .with_solver(solver);
    info!("root face: {}", codec.root_face());
    info!("leaf face: {}", codec.leaf_face());
    draw_spanning_tree(
        outdir.join("tree.vtk"),
        &codec.rest().faces,
        &codec.rest().vertices,
        codec.tree(),
    )
    .context("Failed to write tree.vtk")?;

    let angles = codec.encode(&prev, &curr).context("Failed to encode frame")?;
    write_data_text(outdir.join("data.txt"), &angles.deltas).context("Failed to write data.txt")?;

    // root corners held at their true positions
    let faces = &codec.rest().faces;
    let pins: Vec<(usize, Point3d)> = faces[codec.root_face()].iter().map(|&v| (v, curr[v])).collect();

    let unquantized = codec
        .decode_with_pins(&prev, &angles, &pins)
        .context("Failed to decode unquantized angles")?;
    write_positions(faces, &unquantized.positions, outdir.join("tri_recover_unquantized.obj"))
        .context("Failed to write unquantized reconstruction")?;
    info!("unquantized max vertex error: {:.6e}", max_distance(&unquantized.positions, &curr));

    let frame = AnimationCodec::quantize(&angles, &quantizer)?;
    info!("quantization bound: [{}, {}]", -quantizer.bound(), quantizer.bound());
    write_frame(outdir.join("header.json"), outdir.join("quant.dat"), &frame)
        .context("Failed to write compressed frame")?;

    let dequantized = frame.dequantize()?;
    let error: Vec<f64> = dequantized
        .deltas
        .iter()
        .zip(&angles.deltas)
        .map(|(q, a)| q - a)
        .collect();
    write_data_text(outdir.join("error.txt"), &error).context("Failed to write error.txt")?;

    let quantized = codec
        .decode_with_pins(&prev, &dequantized, &pins)
        .context("Failed to decode quantized angles")?;
    write_positions(faces, &quantized.positions, outdir.join("tri_recover_quantized.obj"))
        .context("Failed to write quantized reconstruction")?;
    info!("quantized max vertex error: {:.6e}", max_distance(&quantized.positions, &curr));

    info!("done");
    Ok(())
}

/// Rebuild a frame from its header, codes and the previous frame
pub fn decompress(
    header: &Path,
    codes: &Path,
    rest: &Path,
    prev: &Path,
    out: &Path,
    solver: &str,
) -> Result<()> {
    let solver: LinearSolverKind = solver.parse()?;
    let frame = read_frame(header, codes)
        .with_context(|| format!("Failed to read frame {} / {}", header.display(), codes.display()))?;
    let rest_mesh = read_mesh(rest).with_context(|| format!("Failed to load rest mesh {}", rest.display()))?;
    let prev_positions = read_frame_positions(&rest_mesh, prev)
        .with_context(|| format!("Failed to load previous frame {}", prev.display()))?;

    let codec = AnimationCodec::new(rest_mesh, frame.header.root_face)
        .context("Failed to build dual graph and spanning tree")?
        .with_solver(solver);
    let reconstruction = codec
        .decompress(&prev_positions, &frame)
        .context("Failed to decode frame")?;
    write_positions(&codec.rest().faces, &reconstruction.positions, out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("wrote {}", out.display());
    Ok(())
}

/// Dump the delta angles of every frame against the rest pose
pub fn encode_sequence(input_dir: &Path, out_dir: &Path) -> Result<()> {
    let rest_file = rest_path(input_dir);
    let rest = read_mesh(&rest_file)
        .with_context(|| format!("Failed to load rest configuration {}", rest_file.display()))?;
    let frames = discover_frames(input_dir);
    if frames.is_empty() {
        bail!("no frames named NNNN_00.obj in {}", input_dir.display());
    }
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let codec = AnimationCodec::new(rest, 0).context("Failed to build dual graph and spanning tree")?;
    for (i, path) in frames.iter().enumerate() {
        info!("processing frame {}", i);
        let curr = read_frame_positions(codec.rest(), path)
            .with_context(|| format!("Failed to load frame {}", path.display()))?;
        let angles = codec
            .encode(&codec.rest().vertices, &curr)
            .with_context(|| format!("Failed to encode frame {}", i))?;

        let stem = frame_output_stem("delta_angle", i);
        write_data_binary(out_dir.join(format!("{}.dat", stem)), &angles.deltas)?;
        write_data_text(out_dir.join(format!("{}.txt", stem)), &angles.deltas)?;
    }
    info!("encoded {} frames", frames.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dihedra_core::TriangleMesh;
    use dihedra_io::{frame_path, write_mesh};
    use tempfile::tempdir;

    fn grid(n: usize) -> TriangleMesh {
        let mut vertices = Vec::new();
        for y in 0..=n {
            for x in 0..=n {
                vertices.push(Point3d::new(x as f64, y as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for y in 0..n {
            for x in 0..n {
                let tl = y * (n + 1) + x;
                let bl = tl + n + 1;
                faces.push([tl, tl + 1, bl]);
                faces.push([tl + 1, bl + 1, bl]);
            }
        }
        TriangleMesh::from_vertices_and_faces(vertices, faces)
    }

    /// Fold everything right of `x = 1` upwards by `angle`
    fn lift(mesh: &TriangleMesh, angle: f64) -> Vec<Point3d> {
        mesh.vertices
            .iter()
            .map(|p| {
                if p.x > 1.0 {
                    let r = p.x - 1.0;
                    Point3d::new(1.0 + r * angle.cos(), p.y, r * angle.sin())
                } else {
                    *p
                }
            })
            .collect()
    }

    fn write_config(path: &Path, dir: &Path, root_face: usize) {
        let config = serde_json::json!({
            "mesh_rest": dir.join("rest.obj"),
            "mesh_prev": dir.join("prev.obj"),
            "mesh_curr": dir.join("curr.obj"),
            "outdir": dir.join("out"),
            "root_face": root_face,
            "bits": 8,
            "linear_solver": "cholesky",
        });
        fs::write(path, config.to_string()).unwrap();
    }

    #[test]
    fn test_compress_then_decompress() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let rest = grid(3);
        write_mesh(&rest, dir.join("rest.obj")).unwrap();
        write_positions(&rest.faces, &rest.vertices, dir.join("prev.obj")).unwrap();
        write_positions(&rest.faces, &lift(&rest, 0.5), dir.join("curr.obj")).unwrap();
        write_config(&dir.join("config.json"), dir, 0);
        let outdir = dir.join("out");

        let dot_dir = dir.join("dot");
        compress(&dir.join("config.json"), Some(dot_dir.as_path())).unwrap();
        for name in [
            "tri_ground_truth.obj",
            "tree.vtk",
            "data.txt",
            "tri_recover_unquantized.obj",
            "header.json",
            "quant.dat",
            "error.txt",
            "tri_recover_quantized.obj",
        ] {
            assert!(outdir.join(name).is_file(), "missing {}", name);
        }
        assert!(dir.join("dot").join("dual_graph.dot").is_file());
        assert!(dir.join("dot").join("spanning_tree.dot").is_file());
        assert_eq!(fs::metadata(outdir.join("quant.dat")).unwrap().len(), 17);

        let out = dir.join("decoded.obj");
        decompress(
            &outdir.join("header.json"),
            &outdir.join("quant.dat"),
            &dir.join("rest.obj"),
            &dir.join("prev.obj"),
            &out,
            "lu",
        )
        .unwrap();
        let decoded = read_frame_positions(&rest, &out).unwrap();
        assert!(max_distance(&decoded, &lift(&rest, 0.5)) < 0.1);
    }

    #[test]
    fn test_root_face_checked_before_any_output() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let rest = grid(1);
        write_mesh(&rest, dir.join("rest.obj")).unwrap();
        write_positions(&rest.faces, &rest.vertices, dir.join("prev.obj")).unwrap();
        write_positions(&rest.faces, &rest.vertices, dir.join("curr.obj")).unwrap();
        write_config(&dir.join("config.json"), dir, 2);

        let err = compress(&dir.join("config.json"), None).unwrap_err();
        assert!(format!("{:#}", err).contains("root face 2 out of range"));
        assert!(!dir.join("out").exists());
    }

    #[test]
    fn test_bad_config_fails_before_loading_meshes() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let config = r#"{"mesh_rest": "missing.obj", "mesh_prev": "missing.obj",
                         "mesh_curr": "missing.obj", "outdir": "unused", "bits": 12}"#;
        fs::write(dir.join("config.json"), config).unwrap();
        let err = compress(&dir.join("config.json"), None).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid config"));
    }

    #[test]
    fn test_encode_sequence_dumps() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path();
        let out = dir.join("out");
        let rest = grid(2);
        write_mesh(&rest, rest_path(dir)).unwrap();
        for i in 0..3 {
            write_positions(&rest.faces, &lift(&rest, 0.1 * i as f64), frame_path(dir, i)).unwrap();
        }

        encode_sequence(dir, &out).unwrap();
        for i in 0..3 {
            let dat = out.join(format!("delta_angle_{:04}.dat", i));
            // 8 faces give 7 angles of 8 bytes each
            assert_eq!(fs::metadata(&dat).unwrap().len(), 56);
            assert!(out.join(format!("delta_angle_{:04}.txt", i)).is_file());
        }
        assert!(!out.join("delta_angle_0003.dat").exists());
    }
}
