//! Partition nodes into build groups by signature.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shipwright_workflow::{Signature, Workflow, WorkflowError};

/// Nodes that share one signature and can therefore share one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildGroup {
  pub signature: Signature,
  /// Member node IDs in first-seen order.
  pub node_ids: Vec<String>,
}

/// Group every node of a signed workflow by signature.
///
/// Groups are returned in the order their first member appears in the
/// workflow, and members keep workflow order. Fails with
/// [`WorkflowError::MissingSignature`] naming the first node that has not
/// been signed.
pub fn plan_groups(workflow: &Workflow) -> Result<Vec<BuildGroup>, WorkflowError> {
  let mut groups: Vec<BuildGroup> = Vec::new();
  let mut by_signature: HashMap<&Signature, usize> = HashMap::new();

  for node in workflow.nodes() {
    let signature = node.signature()?;
    match by_signature.get(signature) {
      Some(&idx) => groups[idx].node_ids.push(node.id().to_string()),
      None => {
        by_signature.insert(signature, groups.len());
        groups.push(BuildGroup {
          signature: signature.clone(),
          node_ids: vec![node.id().to_string()],
        });
      }
    }
  }

  Ok(groups)
}
