//! On-disk forms of codes, angle dumps and frame headers
//!
//! Codes are raw `i8` bytes and binary angle dumps are native-endian `f64`
//! values, both without any framing. Headers are JSON.

use crate::codec::{CompressedFrame, FrameHeader};
use dihedra_core::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Write codes as one byte each
pub fn write_codes<P: AsRef<Path>>(path: P, codes: &[i8]) -> Result<()> {
    std::fs::write(path.as_ref(), bytemuck::cast_slice::<i8, u8>(codes))?;
    debug!("wrote {} codes to {}", codes.len(), path.as_ref().display());
    Ok(())
}

/// Read codes written by [`write_codes`]
pub fn read_codes<P: AsRef<Path>>(path: P) -> Result<Vec<i8>> {
    let bytes = std::fs::read(path)?;
    Ok(bytemuck::cast_slice::<u8, i8>(&bytes).to_vec())
}

/// Write `index value` lines, one per angle
pub fn write_data_text<P: AsRef<Path>>(path: P, values: &[f64]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (i, v) in values.iter().enumerate() {
        writeln!(writer, "{} {}", i, v)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write angles as raw native-endian `f64`
pub fn write_data_binary<P: AsRef<Path>>(path: P, values: &[f64]) -> Result<()> {
    std::fs::write(path, bytemuck::cast_slice::<f64, u8>(values))?;
    Ok(())
}

/// Read angles written by [`write_data_binary`]
pub fn read_data_binary<P: AsRef<Path>>(path: P) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path.as_ref())?;
    let width = std::mem::size_of::<f64>();
    if bytes.len() % width != 0 {
        return Err(Error::InvalidData(format!(
            "{} is {} bytes, not a whole number of f64 values",
            path.as_ref().display(),
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(width)
        .map(bytemuck::pod_read_unaligned::<f64>)
        .collect())
}

/// Write a frame header as pretty JSON
pub fn write_header<P: AsRef<Path>>(path: P, header: &FrameHeader) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, header)
        .map_err(|e| Error::InvalidData(format!("cannot serialize frame header: {}", e)))?;
    writer.flush()?;
    Ok(())
}

pub fn read_header<P: AsRef<Path>>(path: P) -> Result<FrameHeader> {
    let text = std::fs::read_to_string(path.as_ref())?;
    serde_json::from_str(&text).map_err(|e| Error::Parse {
        path: path.as_ref().display().to_string(),
        line: e.line(),
        message: e.to_string(),
    })
}

/// Write a compressed frame as a header file and a code file
pub fn write_frame<P: AsRef<Path>, Q: AsRef<Path>>(
    header_path: P,
    codes_path: Q,
    frame: &CompressedFrame,
) -> Result<()> {
    write_header(header_path, &frame.header)?;
    write_codes(codes_path, &frame.codes)
}

/// Read a compressed frame, checking the code count against the header
pub fn read_frame<P: AsRef<Path>, Q: AsRef<Path>>(header_path: P, codes_path: Q) -> Result<CompressedFrame> {
    let header = read_header(header_path)?;
    let codes = read_codes(codes_path)?;
    if codes.len() != header.angle_count {
        return Err(Error::InvalidData(format!(
            "header announces {} angles but {} codes were read",
            header.angle_count,
            codes.len()
        )));
    }
    Ok(CompressedFrame { header, codes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantize::ValueRange;
    use approx::assert_abs_diff_eq;
    use dihedra_core::{LocalFrame, Point3d};
    use tempfile::{tempdir, NamedTempFile};

    fn header(angle_count: usize) -> FrameHeader {
        let frame = LocalFrame::from_triangle(
            &Point3d::new(0.0, 0.0, 0.0),
            &Point3d::new(1.0, 0.0, 0.0),
            &Point3d::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        FrameHeader {
            bits: 6,
            range: ValueRange::new(-0.25, 0.5).unwrap(),
            root_face: 0,
            leaf_face: 3,
            root_anchor: frame,
            leaf_anchor: frame,
            angle_count,
        }
    }

    #[test]
    fn test_codes_are_one_byte_each() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path();
        write_codes(path, &[-127, -1, 0, 5, 127]).unwrap();
        assert_eq!(std::fs::metadata(path).unwrap().len(), 5);
        assert_eq!(read_codes(path).unwrap(), vec![-127, -1, 0, 5, 127]);
    }

    #[test]
    fn test_text_dump_format() {
        let file = NamedTempFile::new().unwrap();
        write_data_text(file.path(), &[0.5, -0.25]).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "0 0.5\n1 -0.25\n");
    }

    #[test]
    fn test_binary_dump_rejects_trailing_bytes() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path();
        write_data_binary(path, &[1.5, -2.0, 0.125]).unwrap();
        assert_eq!(read_data_binary(path).unwrap(), vec![1.5, -2.0, 0.125]);

        let mut bytes = std::fs::read(path).unwrap();
        bytes.push(0);
        std::fs::write(path, bytes).unwrap();
        assert!(matches!(read_data_binary(path), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_frame_files() {
        let dir = tempdir().unwrap();
        let header_path = dir.path().join("frame.json");
        let codes_path = dir.path().join("frame.dat");
        let frame = CompressedFrame {
            header: header(3),
            codes: vec![-31, 0, 31],
        };
        write_frame(&header_path, &codes_path, &frame).unwrap();
        let back = read_frame(&header_path, &codes_path).unwrap();
        assert_eq!(back.codes, frame.codes);
        assert_eq!(back.header.bits, 6);
        assert_eq!(back.header.range, frame.header.range);
        assert_eq!((back.header.root_face, back.header.leaf_face), (0, 3));
        assert_abs_diff_eq!(back.header.root_anchor.origin, frame.header.root_anchor.origin, epsilon = 1e-15);
        assert_abs_diff_eq!(back.header.leaf_anchor.angle_to(&frame.header.leaf_anchor), 0.0, epsilon = 1e-7);

        write_codes(&codes_path, &[1, 2]).unwrap();
        assert!(read_frame(&header_path, &codes_path).is_err());

        std::fs::write(&header_path, "{ not json").unwrap();
        assert!(matches!(read_header(&header_path), Err(Error::Parse { .. })));
    }
}
