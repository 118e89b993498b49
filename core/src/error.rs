//! Error types for ovtk-adaptor.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for adaptor operations.
pub type Result<T> = std::result::Result<T, AdaptorError>;

/// Errors that can occur while loading models or running inference.
#[derive(Debug, Error)]
pub enum AdaptorError {
    /// Load was called without a model descriptor path.
    #[error("Model descriptor path missing")]
    MissingDescriptor,

    /// Inference was requested before a model was loaded.
    #[error("Infer request is not created; load a model first")]
    NotLoaded,

    /// Input buffer does not fit the shape it was declared with.
    #[error("Shape mismatch for input '{key}': shape {shape:?} needs {expected} elements, got {actual}")]
    ShapeMismatch {
        key: String,
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    /// Input key is not an integer input index.
    #[error("Invalid input key: '{0}'")]
    InvalidInputKey(String),

    /// Fault reported by the inference engine.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Model loading failed.
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    /// Inference failed.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Invalid tensor.
    #[error("Invalid tensor: {0}")]
    Tensor(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model staging error.
    #[error("Staging error: {0}")]
    Staging(String),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

impl AdaptorError {
    /// Create an engine error.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create a model load error.
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create an inference error.
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a tensor error.
    pub fn tensor(msg: impl Into<String>) -> Self {
        Self::Tensor(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a staging error.
    pub fn staging(msg: impl Into<String>) -> Self {
        Self::Staging(msg.into())
    }

    /// Whether this error is a violated call-order precondition rather than
    /// a fault from the engine or the filesystem.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingDescriptor | Self::NotLoaded)
    }
}
