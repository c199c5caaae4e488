//! Animation sequence layout on disk
//!
//! A sequence directory holds the rest pose as `rest.obj` and the frames as
//! `0000_00.obj`, `0001_00.obj`, ... numbered without gaps. The first missing
//! number ends the sequence.

use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the rest pose inside a sequence directory
pub const REST_FILE_NAME: &str = "rest.obj";

/// Upper bound on frame numbers, matching the four-digit names
pub const MAX_FRAMES: usize = 10_000;

/// Path of the rest pose in `dir`
pub fn rest_path<P: AsRef<Path>>(dir: P) -> PathBuf {
    dir.as_ref().join(REST_FILE_NAME)
}

/// Path of frame `index` in `dir`
pub fn frame_path<P: AsRef<Path>>(dir: P, index: usize) -> PathBuf {
    dir.as_ref().join(format!("{:04}_00.obj", index))
}

/// Existing frames of the sequence in `dir`, in order
pub fn discover_frames<P: AsRef<Path>>(dir: P) -> Vec<PathBuf> {
    let frames: Vec<PathBuf> = (0..MAX_FRAMES)
        .map(|i| frame_path(dir.as_ref(), i))
        .take_while(|p| p.is_file())
        .collect();
    debug!("found {} frames in {}", frames.len(), dir.as_ref().display());
    frames
}

/// Stem used for per-frame outputs, such as `delta_angle_0007`
pub fn frame_output_stem(prefix: &str, index: usize) -> String {
    format!("{}_{:04}", prefix, index)
}
