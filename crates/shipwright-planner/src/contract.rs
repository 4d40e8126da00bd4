//! Data-contract compatibility between edge endpoints.
//!
//! Only edges that declare a `data_contract` are checked. The type carried by
//! the edge is the contract's `"format"` when given, otherwise the source
//! node's I/O format; it must be acceptable to the destination node's format.

use serde::{Deserialize, Serialize};
use shipwright_workflow::{IoFormat, Workflow, WorkflowError};
use thiserror::Error;
use tracing::warn;

/// Outcome of checking one `from -> to` transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
  Ok,
  /// Risky coercion; allowed but reported.
  Warn,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompatRule {
  Pair {
    from: IoFormat,
    to: IoFormat,
    result: Compatibility,
  },
  /// Applies when no pair rule or global rule matched. On the wire this is
  /// `{"default": true, "result": ...}`; a rule with `"default": false` is
  /// kept but never applied.
  Fallback {
    default: bool,
    result: Compatibility,
  },
}

impl CompatRule {
  /// An active fallback rule.
  pub fn fallback(result: Compatibility) -> Self {
    Self::Fallback {
      default: true,
      result,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
  #[error("cannot overwrite protected default rule: {from}->{to}")]
  Protected { from: IoFormat, to: IoFormat },

  #[error("unsafe coercion \"{from}->{to}\" cannot be marked ok; use warn or error")]
  UnsafeCoercion { from: IoFormat, to: IoFormat },
}

/// Rule set used to judge transfers. User rules take precedence over defaults
/// but may not replace a default pair.
#[derive(Debug, Clone)]
pub struct CompatibilityRules {
  defaults: Vec<CompatRule>,
  user: Vec<CompatRule>,
}

impl Default for CompatibilityRules {
  fn default() -> Self {
    let mut defaults: Vec<CompatRule> = IoFormat::ALL
      .into_iter()
      .map(|format| CompatRule::Pair {
        from: format,
        to: format,
        result: Compatibility::Ok,
      })
      .collect();
    defaults.push(CompatRule::Pair {
      from: IoFormat::Parquet,
      to: IoFormat::Avro,
      result: Compatibility::Warn,
    });
    defaults.push(CompatRule::Pair {
      from: IoFormat::Avro,
      to: IoFormat::Parquet,
      result: Compatibility::Warn,
    });

    Self {
      defaults,
      user: Vec::new(),
    }
  }
}

impl CompatibilityRules {
  /// Add a user rule.
  ///
  /// Pair rules may not target a default pair and may not declare a coercion
  /// `ok`.
  pub fn add_user_rule(&mut self, rule: CompatRule) -> Result<(), RuleError> {
    if let CompatRule::Pair { from, to, result } = rule {
      let protected = self
        .defaults
        .iter()
        .any(|r| matches!(r, CompatRule::Pair { from: f, to: t, .. } if *f == from && *t == to));
      if protected {
        return Err(RuleError::Protected { from, to });
      }
      if result == Compatibility::Ok {
        return Err(RuleError::UnsafeCoercion { from, to });
      }
    }

    self.user.push(rule);
    Ok(())
  }

  pub fn reset_user_rules(&mut self) {
    self.user.clear();
  }

  /// Judge a transfer of `from` data into a node reading `to`.
  pub fn evaluate(&self, from: IoFormat, to: IoFormat) -> Compatibility {
    let all = || self.user.iter().chain(self.defaults.iter());

    for rule in all() {
      if let CompatRule::Pair {
        from: f,
        to: t,
        result,
      } = rule
        && *f == from
        && *t == to
      {
        return *result;
      }
    }

    // Anything can be carried as raw bytes, and bytes can be reinterpreted,
    // but both need a second look.
    if to == IoFormat::Bytes || from == IoFormat::Bytes {
      return Compatibility::Warn;
    }

    all()
      .find_map(|rule| match rule {
        CompatRule::Fallback {
          default: true,
          result,
        } => Some(*result),
        _ => None,
      })
      .unwrap_or(Compatibility::Error)
  }
}

/// A transfer that was allowed with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractWarning {
  pub src: String,
  pub dst: String,
  pub from: IoFormat,
  pub to: IoFormat,
}

/// Check every edge that carries a data contract.
///
/// Returns the warnings on success. The first incompatible edge fails the
/// whole check with [`WorkflowError::IncompatibleContract`].
pub fn validate_contracts(
  workflow: &Workflow,
  rules: &CompatibilityRules,
) -> Result<Vec<ContractWarning>, WorkflowError> {
  let mut warnings = Vec::new();

  for edge in workflow.edges() {
    let Some(contract) = &edge.data_contract else {
      continue;
    };

    let invalid_edge = || WorkflowError::InvalidEdge {
      from: edge.src.clone(),
      to: edge.dst.clone(),
    };
    let src = workflow.get_node(&edge.src).ok_or_else(invalid_edge)?;
    let dst = workflow.get_node(&edge.dst).ok_or_else(invalid_edge)?;

    let from = match contract.get("format") {
      None => src.io_format(),
      Some(serde_json::Value::String(name)) => {
        name
          .parse::<IoFormat>()
          .map_err(|message| WorkflowError::IncompatibleContract {
            from: edge.src.clone(),
            to: edge.dst.clone(),
            message,
          })?
      }
      Some(other) => {
        return Err(WorkflowError::IncompatibleContract {
          from: edge.src.clone(),
          to: edge.dst.clone(),
          message: format!("contract format must be a string, got {}", other),
        });
      }
    };
    let to = dst.io_format();

    match rules.evaluate(from, to) {
      Compatibility::Ok => {}
      Compatibility::Warn => {
        warn!(
          src = %edge.src,
          dst = %edge.dst,
          from = %from,
          to = %to,
          "risky coercion on edge"
        );
        warnings.push(ContractWarning {
          src: edge.src.clone(),
          dst: edge.dst.clone(),
          from,
          to,
        });
      }
      Compatibility::Error => {
        return Err(WorkflowError::IncompatibleContract {
          from: edge.src.clone(),
          to: edge.dst.clone(),
          message: format!("{} cannot be read as {}", from, to),
        });
      }
    }
  }

  Ok(warnings)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn workflow(edges: serde_json::Value) -> Workflow {
    let def = serde_json::from_value(json!({
      "nodes": [
        { "id": "j", "type": "ingest", "runtime": "py3.10", "io_format": "json" },
        { "id": "p", "type": "train", "runtime": "py3.10", "io_format": "parquet" },
        { "id": "a", "type": "train", "runtime": "py3.10", "io_format": "avro" },
        { "id": "b", "type": "sink", "runtime": "py3.10", "io_format": "bytes" }
      ],
      "edges": edges
    }))
    .unwrap();
    Workflow::from_def(def).unwrap()
  }

  #[test]
  fn test_default_rules() {
    let rules = CompatibilityRules::default();
    assert_eq!(rules.evaluate(IoFormat::Json, IoFormat::Json), Compatibility::Ok);
    assert_eq!(rules.evaluate(IoFormat::Bytes, IoFormat::Bytes), Compatibility::Ok);
    assert_eq!(rules.evaluate(IoFormat::Parquet, IoFormat::Avro), Compatibility::Warn);
    assert_eq!(rules.evaluate(IoFormat::Json, IoFormat::Bytes), Compatibility::Warn);
    assert_eq!(rules.evaluate(IoFormat::Bytes, IoFormat::Json), Compatibility::Warn);
    assert_eq!(rules.evaluate(IoFormat::Json, IoFormat::Avro), Compatibility::Error);
  }

  #[test]
  fn test_user_rules() {
    let mut rules = CompatibilityRules::default();

    let protected = rules.add_user_rule(CompatRule::Pair {
      from: IoFormat::Json,
      to: IoFormat::Json,
      result: Compatibility::Error,
    });
    assert!(matches!(protected, Err(RuleError::Protected { .. })));

    let unsafe_ok = rules.add_user_rule(CompatRule::Pair {
      from: IoFormat::Json,
      to: IoFormat::Parquet,
      result: Compatibility::Ok,
    });
    assert!(matches!(unsafe_ok, Err(RuleError::UnsafeCoercion { .. })));

    rules
      .add_user_rule(CompatRule::Pair {
        from: IoFormat::Json,
        to: IoFormat::Parquet,
        result: Compatibility::Warn,
      })
      .unwrap();
    assert_eq!(rules.evaluate(IoFormat::Json, IoFormat::Parquet), Compatibility::Warn);

    rules
      .add_user_rule(CompatRule::fallback(Compatibility::Warn))
      .unwrap();
    assert_eq!(rules.evaluate(IoFormat::Json, IoFormat::Avro), Compatibility::Warn);

    rules.reset_user_rules();
    assert_eq!(rules.evaluate(IoFormat::Json, IoFormat::Parquet), Compatibility::Error);
  }

  #[test]
  fn test_rule_wire_format() {
    let pair: CompatRule =
      serde_json::from_value(json!({ "from": "json", "to": "avro", "result": "warn" })).unwrap();
    assert_eq!(
      pair,
      CompatRule::Pair {
        from: IoFormat::Json,
        to: IoFormat::Avro,
        result: Compatibility::Warn
      }
    );

    let fallback: CompatRule =
      serde_json::from_value(json!({ "default": true, "result": "warn" })).unwrap();
    assert_eq!(fallback, CompatRule::fallback(Compatibility::Warn));

    let missing_marker = serde_json::from_value::<CompatRule>(json!({ "result": "warn" }));
    assert!(missing_marker.is_err());
  }

  #[test]
  fn test_inactive_fallback_is_ignored() {
    let mut rules = CompatibilityRules::default();
    let inactive: CompatRule =
      serde_json::from_value(json!({ "default": false, "result": "warn" })).unwrap();
    rules.add_user_rule(inactive).unwrap();
    assert_eq!(rules.evaluate(IoFormat::Json, IoFormat::Avro), Compatibility::Error);

    rules
      .add_user_rule(CompatRule::fallback(Compatibility::Warn))
      .unwrap();
    assert_eq!(rules.evaluate(IoFormat::Json, IoFormat::Avro), Compatibility::Warn);
  }

  #[test]
  fn test_edges_without_contract_are_not_checked() {
    let wf = workflow(json!([{ "src": "j", "dst": "a" }]));
    let warnings = validate_contracts(&wf, &CompatibilityRules::default()).unwrap();
    assert!(warnings.is_empty());
  }

  #[test]
  fn test_incompatible_contract_fails() {
    let wf = workflow(json!([{ "src": "j", "dst": "a", "data_contract": {} }]));
    let err = validate_contracts(&wf, &CompatibilityRules::default()).unwrap_err();
    assert!(matches!(err, WorkflowError::IncompatibleContract { ref from, ref to, .. }
      if from == "j" && to == "a"));
  }

  #[test]
  fn test_contract_format_overrides_source_format() {
    let wf = workflow(json!([
      { "src": "j", "dst": "p", "data_contract": { "format": "parquet", "schema": {} } }
    ]));
    assert!(
      validate_contracts(&wf, &CompatibilityRules::default())
        .unwrap()
        .is_empty()
    );
  }

  #[test]
  fn test_warnings_are_reported() {
    let wf = workflow(json!([
      { "src": "p", "dst": "a", "data_contract": {} },
      { "src": "j", "dst": "b", "data_contract": {} }
    ]));
    let warnings = validate_contracts(&wf, &CompatibilityRules::default()).unwrap();

    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].from, IoFormat::Parquet);
    assert_eq!(warnings[0].to, IoFormat::Avro);
    assert_eq!(warnings[1].dst, "b");
  }

  #[test]
  fn test_unknown_contract_format_fails() {
    let wf = workflow(json!([
      { "src": "j", "dst": "p", "data_contract": { "format": "csv" } }
    ]));
    let err = validate_contracts(&wf, &CompatibilityRules::default()).unwrap_err();
    assert!(matches!(err, WorkflowError::IncompatibleContract { .. }));
  }
}
