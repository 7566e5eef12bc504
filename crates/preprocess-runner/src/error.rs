//! Error types for the preprocess bridge.

use thiserror::Error;

/// Error types for the preprocess runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Failed to spawn the worker process.
    #[error("failed to spawn preprocess worker: {0}")]
    SpawnFailed(#[from] std::io::Error),

    /// The worker wrote more than `max_buffer` bytes to stdout.
    #[error("spawnSync {program} ENOBUFS: preprocess output exceeded maxBuffer of {limit} bytes")]
    BufferOverflow { program: String, limit: usize },

    /// The worker exited with a non-zero status.
    #[error("preprocess worker exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    /// The worker's stdout was not a single JSON response line.
    #[error("failed to parse preprocess worker output: {message}\n{output}")]
    Protocol { message: String, output: String },

    /// A request field was missing from the worker environment.
    #[error("missing preprocess envelope variable `{0}`")]
    Envelope(&'static str),

    /// Failed to install the node worker script or locate node.
    #[error("failed to install preprocess worker: {0}")]
    InstallFailed(String),
}

/// An error raised by a preprocessor implementation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PreprocessError {
    /// Human-readable description.
    pub message: String,
}

impl PreprocessError {
    /// Creates a new preprocess error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
