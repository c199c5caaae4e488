//! JSON configuration of the `compress` command
//!
//! ```json
//! {
//!   "mesh_rest": "data/rest.obj",
//!   "mesh_prev": "data/0010_00.obj",
//!   "mesh_curr": "data/0011_00.obj",
//!   "outdir": "out",
//!   "root_face": 0,
//!   "bits": 8,
//!   "linear_solver": "cholesky"
//! }
//! ```

use anyhow::{Context, Result};
use dihedra_codec::{LinearSolverKind, Quantizer};
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_bits() -> u32 {
    8
}

fn default_solver() -> String {
    LinearSolverKind::default().to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompressionConfig {
    pub mesh_rest: PathBuf,
    pub mesh_prev: PathBuf,
    pub mesh_curr: PathBuf,
    pub outdir: PathBuf,
    #[serde(default)]
    pub root_face: usize,
    #[serde(default = "default_bits")]
    pub bits: u32,
    #[serde(default = "default_solver")]
    pub linear_solver: String,
}

impl CompressionConfig {
    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Check bit depth and solver name before any mesh is loaded
    pub fn validate(&self) -> Result<()> {
        self.quantizer()?;
        self.solver()?;
        Ok(())
    }

    pub fn quantizer(&self) -> Result<Quantizer> {
        Ok(Quantizer::new(self.bits)?)
    }

    pub fn solver(&self) -> Result<LinearSolverKind> {
        Ok(self.linear_solver.parse()?)
    }
}
