use serde::{Deserialize, Serialize};

/// A directed data-flow arc between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub src: String,
  pub dst: String,
  /// Opaque description of the schema carried over this edge.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data_contract: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latency_req_ms: Option<u64>,
  /// Boolean expression gating the edge, e.g. `"flag == true"`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub condition: Option<String>,
}
