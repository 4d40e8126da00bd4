use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declared I/O encoding of a node.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IoFormat {
  #[default]
  Json,
  Bytes,
  /// Columnar binary encoding.
  Parquet,
  /// Row-oriented binary encoding.
  Avro,
}

impl IoFormat {
  pub const ALL: [IoFormat; 4] = [
    IoFormat::Json,
    IoFormat::Bytes,
    IoFormat::Parquet,
    IoFormat::Avro,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      IoFormat::Json => "json",
      IoFormat::Bytes => "bytes",
      IoFormat::Parquet => "parquet",
      IoFormat::Avro => "avro",
    }
  }
}

impl fmt::Display for IoFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for IoFormat {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    IoFormat::ALL
      .into_iter()
      .find(|format| format.as_str() == s)
      .ok_or_else(|| format!("unknown io format: {}", s))
  }
}

/// How a node is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
  #[default]
  Event,
  Cron,
  Manual,
}
