use serde::Serialize;
use shipwright_config::{IoFormat, NodeDef, TriggerType};

use crate::error::WorkflowError;
use crate::signature::Signature;

/// A validated unit of computation.
///
/// Every field except the signature is fixed at construction and only
/// readable afterwards. The signature slot is written once, through
/// [`Workflow::attach_signature`](crate::Workflow::attach_signature).
///
/// ```compile_fail
/// use shipwright_workflow::Node;
///
/// fn rename(node: &mut Node) {
///   node.id = "other".to_string();
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
  id: String,
  #[serde(rename = "type")]
  node_type: String,
  runtime: String,
  deps: Vec<String>,
  needs_gpu: bool,
  cpu: f64,
  mem_mb: u64,
  avg_runtime_ms: u64,
  io_format: IoFormat,
  stateful: bool,
  trigger_type: TriggerType,
  #[serde(skip_serializing_if = "Option::is_none")]
  signature: Option<Signature>,
}

impl Node {
  /// Validate a node definition.
  pub fn from_def(def: NodeDef) -> Result<Self, WorkflowError> {
    if def.id.is_empty() {
      return Err(WorkflowError::InvalidNode {
        node_id: def.id,
        message: "node id must not be empty".to_string(),
      });
    }
    if !def.cpu.is_finite() || def.cpu <= 0.0 {
      return Err(WorkflowError::InvalidNode {
        message: format!("cpu allotment must be a positive number, got {}", def.cpu),
        node_id: def.id,
      });
    }
    if def.mem_mb == 0 {
      return Err(WorkflowError::InvalidNode {
        node_id: def.id,
        message: "memory allotment must be positive".to_string(),
      });
    }

    Ok(Self {
      id: def.id,
      node_type: def.node_type,
      runtime: def.runtime,
      deps: def.deps,
      needs_gpu: def.needs_gpu,
      cpu: def.cpu,
      mem_mb: def.mem_mb,
      avg_runtime_ms: def.avg_runtime_ms,
      io_format: def.io_format,
      stateful: def.stateful,
      trigger_type: def.trigger_type,
      signature: None,
    })
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn node_type(&self) -> &str {
    &self.node_type
  }

  pub fn runtime(&self) -> &str {
    &self.runtime
  }

  /// Dependencies as declared, duplicates and order included.
  pub fn deps(&self) -> &[String] {
    &self.deps
  }

  pub fn needs_gpu(&self) -> bool {
    self.needs_gpu
  }

  pub fn cpu(&self) -> f64 {
    self.cpu
  }

  pub fn mem_mb(&self) -> u64 {
    self.mem_mb
  }

  pub fn avg_runtime_ms(&self) -> u64 {
    self.avg_runtime_ms
  }

  pub fn io_format(&self) -> IoFormat {
    self.io_format
  }

  pub fn stateful(&self) -> bool {
    self.stateful
  }

  pub fn trigger_type(&self) -> TriggerType {
    self.trigger_type
  }

  /// The node's signature.
  ///
  /// Fails with [`WorkflowError::MissingSignature`] until the signature pass
  /// has run.
  pub fn signature(&self) -> Result<&Signature, WorkflowError> {
    self
      .signature
      .as_ref()
      .ok_or_else(|| WorkflowError::MissingSignature {
        node_id: self.id.clone(),
      })
  }

  pub fn has_signature(&self) -> bool {
    self.signature.is_some()
  }

  /// Attach the signature. Attaching the same value again is a no-op;
  /// attaching a different one is rejected.
  pub(crate) fn attach_signature(&mut self, signature: Signature) -> Result<(), WorkflowError> {
    match &self.signature {
      None => {
        self.signature = Some(signature);
        Ok(())
      }
      Some(existing) if *existing == signature => Ok(()),
      Some(existing) => Err(WorkflowError::SignatureAlreadyAttached {
        node_id: self.id.clone(),
        existing: existing.to_string(),
      }),
    }
  }
}
