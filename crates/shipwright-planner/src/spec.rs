//! Container build specifications.

use serde::{Deserialize, Serialize};
use shipwright_workflow::{Signature, Workflow, WorkflowError};

use crate::grouping::BuildGroup;

/// Everything the build and registry collaborators need for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
  pub signature: Signature,
  pub node_ids: Vec<String>,
  /// `{type}:{tag}`, where type is the first member's node type and tag the
  /// signature's 8-character prefix. A label, not a key.
  pub image_name: String,
}

/// Produce one spec per group, in group order.
pub fn generate_container_specs(
  workflow: &Workflow,
  groups: &[BuildGroup],
) -> Result<Vec<ContainerSpec>, WorkflowError> {
  groups
    .iter()
    .map(|group| -> Result<ContainerSpec, WorkflowError> {
      let first = group.node_ids.first().ok_or_else(|| {
        WorkflowError::NodeNotFound(format!("empty build group {}", group.signature))
      })?;
      let representative = workflow
        .get_node(first)
        .ok_or_else(|| WorkflowError::NodeNotFound(first.clone()))?;

      Ok(ContainerSpec {
        signature: group.signature.clone(),
        node_ids: group.node_ids.clone(),
        image_name: format!("{}:{}", representative.node_type(), group.signature.tag()),
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grouping::plan_groups;
  use crate::signature::sign_workflow;
  use serde_json::json;

  fn signed() -> (Workflow, Vec<BuildGroup>) {
    let def = serde_json::from_value(json!({
      "nodes": [
        { "id": "a", "type": "ingest", "runtime": "py3.10" },
        { "id": "c", "type": "train", "runtime": "cuda12.1", "deps": ["torch"],
          "needs_gpu": true, "cpu": 2, "mem_mb": 4096, "io_format": "parquet" },
        { "id": "b", "type": "ingest", "runtime": "py3.10" }
      ]
    }))
    .unwrap();
    let mut workflow = Workflow::from_def(def).unwrap();
    sign_workflow(&mut workflow).unwrap();
    let groups = plan_groups(&workflow).unwrap();
    (workflow, groups)
  }

  #[test]
  fn test_image_name_uses_type_and_tag() {
    let (workflow, groups) = signed();
    let specs = generate_container_specs(&workflow, &groups).unwrap();

    assert_eq!(specs.len(), 2);
    for spec in &specs {
      let (ty, tag) = spec.image_name.split_once(':').unwrap();
      assert_eq!(tag.len(), 8);
      assert!(spec.signature.as_str().starts_with(tag));
      assert_eq!(ty, workflow.get_node(&spec.node_ids[0]).unwrap().node_type());
    }
    assert_eq!(specs[0].node_ids, vec!["a", "b"]);
    assert!(specs[1].image_name.starts_with("train:"));
  }

  #[test]
  fn test_regeneration_is_identical() {
    let (workflow, groups) = signed();
    let first = generate_container_specs(&workflow, &groups).unwrap();
    let second = generate_container_specs(&workflow, &groups).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn test_group_with_unknown_member_is_rejected() {
    let (workflow, _) = signed();
    let groups = vec![BuildGroup {
      signature: Signature::new("0123456789"),
      node_ids: vec!["ghost".to_string()],
    }];

    assert_eq!(
      generate_container_specs(&workflow, &groups).unwrap_err(),
      WorkflowError::NodeNotFound("ghost".to_string())
    );
  }
}
