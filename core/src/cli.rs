//! Command-line interface for ovtk-adaptor.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Load OpenVINO models and run inference from the command line.
#[derive(Parser, Debug)]
#[command(name = "ovtk-adaptor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to optional YAML config file.
    ///
    /// Command-line flags take precedence over config values.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a model and run one inference on JSON input.
    Infer {
        /// Path to the model descriptor (.xml); weights are read from the
        /// matching .bin.
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Device to compile for (CPU, GPU, GPU.1, NPU, AUTO).
        #[arg(short, long)]
        device: Option<String>,

        /// Path to input data file.
        ///
        /// JSON object mapping input index to `{"data": [...], "shape": [...]}`.
        #[arg(short, long)]
        input: PathBuf,

        /// Output format (json, pretty).
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Include output values, not just shapes.
        #[arg(long)]
        full: bool,
    },

    /// Show runtime information and check that a model loads.
    Info {
        /// Path to the model descriptor (.xml).
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Device to compile for.
        #[arg(short, long)]
        device: Option<String>,
    },

    /// List devices the runtime can compile for.
    Devices,

    /// Stage a model into the staging directory in chunks.
    Stage {
        /// Name to stage the model under.
        #[arg(short, long)]
        name: Option<String>,

        /// Staging base directory.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Path to the model descriptor (.xml) to stage.
        #[arg(short, long)]
        model: PathBuf,

        /// Chunk size in bytes.
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Wait for a model staged by another process to finish.
    Wait {
        /// Name the model is staged under.
        #[arg(short, long)]
        name: Option<String>,

        /// Staging base directory.
        #[arg(long)]
        dir: Option<PathBuf>,

        /// How long to wait, in milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
