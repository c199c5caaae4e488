//! dihedra - animated mesh compression through delta dihedral angles
//!
//! # Commands
//!
//! - `dihedra compress <config.json>` - encode one frame pair, decode it with
//!   and without quantization, and write every intermediate to the output
//!   directory
//! - `dihedra decompress` - rebuild a frame from a stored header and code file
//! - `dihedra encode-sequence <input_dir> <out_dir>` - dump the delta angles of
//!   every frame of a sequence against its rest pose
//!
//! Logging follows `RUST_LOG`; `--verbose` raises the default level to debug.

mod config;
mod pipeline;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dihedra")]
#[command(about = "Compress animated triangle meshes as delta dihedral angles")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full compression pipeline described by a JSON config
    Compress {
        config: PathBuf,

        /// Also write Graphviz dumps of the dual graph and spanning tree here
        #[arg(long)]
        dot_dir: Option<PathBuf>,
    },

    /// Decode a stored frame
    Decompress {
        /// Frame header written by `compress`
        #[arg(long)]
        header: PathBuf,

        /// Raw code file written by `compress`
        #[arg(long)]
        codes: PathBuf,

        /// Rest mesh the frame was encoded against
        #[arg(long)]
        rest: PathBuf,

        /// Previous frame
        #[arg(long)]
        prev: PathBuf,

        /// Where to write the reconstructed frame
        #[arg(long)]
        out: PathBuf,

        /// Linear solver backend
        #[arg(long, default_value = "cholesky")]
        solver: String,
    },

    /// Encode every `NNNN_00.obj` frame of a directory against its `rest.obj`
    EncodeSequence { input_dir: PathBuf, out_dir: PathBuf },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compress { config, dot_dir } => pipeline::compress(&config, dot_dir.as_deref()),
        Commands::Decompress {
            header,
            codes,
            rest,
            prev,
            out,
            solver,
        } => pipeline::decompress(&header, &codes, &rest, &prev, &out, &solver),
        Commands::EncodeSequence { input_dir, out_dir } => pipeline::encode_sequence(&input_dir, &out_dir),
    }
}
