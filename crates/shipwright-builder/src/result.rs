//! Build results.

use serde::{Deserialize, Serialize};
use shipwright_planner::ContainerSpec;

use crate::registry::UpsertOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildStatus {
  /// Built, pushed and recorded in the registry.
  Registered { registry: UpsertOutcome },
  Failed { error: String },
  /// Not started because the run was cancelled.
  Skipped,
}

/// Outcome for one container spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutcome {
  pub spec: ContainerSpec,
  #[serde(flatten)]
  pub status: BuildStatus,
}

/// Outcomes of a coordinator run, in spec order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
  pub outcomes: Vec<BuildOutcome>,
}

impl BuildReport {
  pub fn failures(&self) -> impl Iterator<Item = &BuildOutcome> {
    self
      .outcomes
      .iter()
      .filter(|o| matches!(o.status, BuildStatus::Failed { .. }))
  }

  pub fn is_success(&self) -> bool {
    self
      .outcomes
      .iter()
      .all(|o| matches!(o.status, BuildStatus::Registered { .. }))
  }
}
