use serde::{Deserialize, Serialize};
use shipwright_workflow::{Workflow, WorkflowError};
use tracing::{info, instrument};

use crate::contract::{CompatibilityRules, ContractWarning, validate_contracts};
use crate::grouping::{BuildGroup, plan_groups};
use crate::signature::sign_workflow;
use crate::spec::{ContainerSpec, generate_container_specs};

/// Result of a complete planning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
  pub workflow_id: String,
  /// Topological order of all node IDs.
  pub order: Vec<String>,
  pub groups: Vec<BuildGroup>,
  pub specs: Vec<ContainerSpec>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<ContractWarning>,
}

/// Runs validation, signing, grouping and spec generation over one workflow.
///
/// The planner holds no per-workflow state, so one instance can plan any
/// number of workflows, including concurrently.
#[derive(Debug, Clone, Default)]
pub struct Planner {
  rules: CompatibilityRules,
}

impl Planner {
  pub fn new(rules: CompatibilityRules) -> Self {
    Self { rules }
  }

  pub fn rules(&self) -> &CompatibilityRules {
    &self.rules
  }

  /// Plan the builds for a workflow.
  ///
  /// Signatures are attached to the workflow's nodes in place. Any failure
  /// aborts the pass before a single spec is returned.
  #[instrument(name = "plan", skip(self, workflow), fields(workflow_id = %workflow.workflow_id))]
  pub fn plan(&self, workflow: &mut Workflow) -> Result<Plan, WorkflowError> {
    let warnings = validate_contracts(workflow, &self.rules)?;
    let order = workflow.graph().topological_order()?;

    sign_workflow(workflow)?;
    let groups = plan_groups(workflow)?;
    let specs = generate_container_specs(workflow, &groups)?;

    info!(
      nodes = workflow.len(),
      groups = groups.len(),
      warnings = warnings.len(),
      "workflow planned"
    );

    Ok(Plan {
      workflow_id: workflow.workflow_id.clone(),
      order,
      groups,
      specs,
      warnings,
    })
  }
}
