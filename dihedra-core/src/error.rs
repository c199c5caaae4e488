//! Error types for dihedra

use thiserror::Error;

/// Main error type for dihedra operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {path} at line {line}: {message}")]
    Parse {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Range error: {0}")]
    Range(String),

    #[error("Singular system: {0}")]
    SingularSystem(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for dihedra operations
pub type Result<T> = std::result::Result<T, Error>;
