use serde::Serialize;
use shipwright_config::EdgeDef;

use crate::error::WorkflowError;

/// A validated data-flow arc. Endpoints are checked by [`crate::Workflow`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
  pub src: String,
  pub dst: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_contract: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub latency_req_ms: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub condition: Option<String>,
}

impl Edge {
  pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Self {
    Self {
      src: src.into(),
      dst: dst.into(),
      data_contract: None,
      latency_req_ms: None,
      condition: None,
    }
  }

  pub fn from_def(def: EdgeDef) -> Result<Self, WorkflowError> {
    if def.latency_req_ms == Some(0) {
      return Err(WorkflowError::InvalidEdgeAttribute {
        from: def.src,
        to: def.dst,
        message: "latency requirement must be positive".to_string(),
      });
    }

    Ok(Self {
      src: def.src,
      dst: def.dst,
      data_contract: def.data_contract,
      latency_req_ms: def.latency_req_ms,
      condition: def.condition,
    })
  }
}
