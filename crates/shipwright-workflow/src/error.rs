use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
  #[error("duplicate node id: {node_id}")]
  DuplicateNodeId { node_id: String },

  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("invalid node '{node_id}': {message}")]
  InvalidNode { node_id: String, message: String },

  #[error("invalid edge {from} -> {to}: {message}")]
  InvalidEdgeAttribute {
    from: String,
    to: String,
    message: String,
  },

  #[error("cycle detected in workflow graph, unordered nodes: {}", .unordered.join(", "))]
  CycleDetected { unordered: Vec<String> },

  #[error("node '{node_id}' has no signature; signatures must be computed first")]
  MissingSignature { node_id: String },

  #[error("node '{node_id}' already carries signature {existing}")]
  SignatureAlreadyAttached { node_id: String, existing: String },

  #[error("incompatible data contract on edge {from} -> {to}: {message}")]
  IncompatibleContract {
    from: String,
    to: String,
    message: String,
  },
}

/// Coarse classification of a [`WorkflowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The graph is not a DAG. No partial result is produced.
  CycleDetected,
  /// A required prior step did not run, or the input breaks referential
  /// integrity. Always a caller programming error.
  Precondition,
  /// The workflow is well formed but declares something that cannot be built.
  Validation,
}

impl WorkflowError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      WorkflowError::CycleDetected { .. } => ErrorKind::CycleDetected,
      WorkflowError::DuplicateNodeId { .. }
      | WorkflowError::NodeNotFound(_)
      | WorkflowError::InvalidEdge { .. }
      | WorkflowError::MissingSignature { .. }
      | WorkflowError::SignatureAlreadyAttached { .. } => ErrorKind::Precondition,
      WorkflowError::InvalidNode { .. }
      | WorkflowError::InvalidEdgeAttribute { .. }
      | WorkflowError::IncompatibleContract { .. } => ErrorKind::Validation,
    }
  }
}
