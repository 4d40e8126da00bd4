use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of the human-legible tag taken from the front of a signature.
pub const TAG_LEN: usize = 8;

/// Hex-encoded digest of a node's build-relevant requirements.
///
/// Two nodes with equal signatures can share one built artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
  pub fn new(hex: impl Into<String>) -> Self {
    Self(hex.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Short prefix used in image tags. Not unique; never use it as a key.
  pub fn tag(&self) -> &str {
    let end = self
      .0
      .char_indices()
      .nth(TAG_LEN)
      .map(|(idx, _)| idx)
      .unwrap_or(self.0.len());
    &self.0[..end]
  }
}

impl fmt::Display for Signature {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
