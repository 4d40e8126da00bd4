//! Deterministic node signatures.

use std::collections::BTreeSet;

use serde_json::json;
use sha2::{Digest, Sha256};
use shipwright_workflow::{Node, Signature, Workflow, WorkflowError};
use tracing::debug;

/// Canonical form of the fields that decide what must be built.
///
/// Object keys serialize in sorted order and dependencies as a sorted,
/// de-duplicated list, so equal requirements always yield equal bytes.
/// ID, runtime telemetry, statefulness and trigger kind are left out: they do
/// not change the artifact.
fn canonical_requirements(node: &Node) -> serde_json::Value {
  let deps: BTreeSet<&str> = node.deps().iter().map(String::as_str).collect();
  json!({
    "cpu": node.cpu(),
    "deps": deps,
    "io_format": node.io_format(),
    "mem_mb": node.mem_mb(),
    "needs_gpu": node.needs_gpu(),
    "runtime": node.runtime(),
    "type": node.node_type(),
  })
}

/// Compute the SHA-256 signature of a node's build requirements.
pub fn compute_signature(node: &Node) -> Signature {
  let canonical = canonical_requirements(node).to_string();
  let digest = Sha256::digest(canonical.as_bytes());
  Signature::new(hex::encode(digest))
}

/// Attach a signature to every node of the workflow.
///
/// Running the pass twice on the same workflow is harmless.
pub fn sign_workflow(workflow: &mut Workflow) -> Result<(), WorkflowError> {
  let signatures: Vec<(String, Signature)> = workflow
    .nodes()
    .iter()
    .map(|node| (node.id().to_string(), compute_signature(node)))
    .collect();

  for (node_id, signature) in signatures {
    debug!(node_id = %node_id, signature = %signature, "node signed");
    workflow.attach_signature(&node_id, signature)?;
  }
  Ok(())
}
