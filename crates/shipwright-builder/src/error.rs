//! Error types for building and registering images.

use thiserror::Error;

/// Errors surfaced by the build and registry collaborators.
#[derive(Debug, Error)]
pub enum BuildError {
  /// An external command exited unsuccessfully.
  #[error("command `{command}` failed with status {status:?}: {stderr}")]
  CommandFailed {
    command: String,
    status: Option<i32>,
    stderr: String,
  },

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Registry contents could not be read or written.
  #[error("registry serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// The build task panicked or was aborted.
  #[error("build task failed: {0}")]
  Task(String),
}
