use serde::{Deserialize, Serialize};

use crate::enums::{IoFormat, TriggerType};

/// A unit of computation as declared by the workflow source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  /// Plugin name or category, e.g. "ingest".
  #[serde(rename = "type")]
  pub node_type: String,
  /// Interpreter or hardware class, e.g. "py3.10", "node18", "cuda12.1".
  pub runtime: String,
  /// Package list or lockfile hashes. Order is irrelevant.
  #[serde(default)]
  pub deps: Vec<String>,
  #[serde(default)]
  pub needs_gpu: bool,
  /// CPU allotment in cores.
  #[serde(default = "default_cpu")]
  pub cpu: f64,
  #[serde(default = "default_mem_mb")]
  pub mem_mb: u64,
  /// Observed average execution time. Telemetry only.
  #[serde(default)]
  pub avg_runtime_ms: u64,
  #[serde(default)]
  pub io_format: IoFormat,
  #[serde(default)]
  pub stateful: bool,
  #[serde(default)]
  pub trigger_type: TriggerType,
}

fn default_cpu() -> f64 {
  0.5
}

fn default_mem_mb() -> u64 {
  512
}
