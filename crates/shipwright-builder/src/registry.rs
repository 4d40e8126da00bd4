use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shipwright_planner::{ContainerSpec, Signature};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::BuildError;

/// What an upsert did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
  Inserted,
  Updated,
  /// The stored entry already matched; nothing was written.
  Unchanged,
}

/// Durable record of built images, keyed by signature.
#[async_trait]
pub trait RegistryStore: Send + Sync {
  /// Insert the spec, or replace the node IDs and image name of the entry
  /// with the same signature.
  async fn upsert(&self, spec: &ContainerSpec) -> Result<UpsertOutcome, BuildError>;

  /// Look up the entry for a signature.
  async fn get(&self, signature: &Signature) -> Result<Option<ContainerSpec>, BuildError>;

  /// List all entries ordered by signature.
  async fn list(&self) -> Result<Vec<ContainerSpec>, BuildError>;
}

/// Filesystem-based registry.
///
/// All entries live in a single JSON document:
/// ```text
/// {root}/
/// └── registry.json   # { "<signature>": { signature, node_ids, image_name } }
/// ```
pub struct FsRegistry {
  root: PathBuf,
  write_lock: Mutex<()>,
}

impl FsRegistry {
  const FILE_NAME: &'static str = "registry.json";

  /// Create a new filesystem registry at the given root path.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      write_lock: Mutex::new(()),
    }
  }

  /// Get the root directory of the registry.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn file_path(&self) -> PathBuf {
    self.root.join(Self::FILE_NAME)
  }

  async fn read_entries(&self) -> Result<BTreeMap<String, ContainerSpec>, BuildError> {
    match fs::read_to_string(self.file_path()).await {
      Ok(content) => Ok(serde_json::from_str(&content)?),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
      Err(e) => Err(e.into()),
    }
  }

  /// Replace the registry file atomically.
  async fn write_entries(&self, entries: &BTreeMap<String, ContainerSpec>) -> Result<(), BuildError> {
    fs::create_dir_all(&self.root).await?;
    let tmp = self.root.join(format!("{}.tmp", Self::FILE_NAME));
    fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
    fs::rename(&tmp, self.file_path()).await?;
    Ok(())
  }
}

#[async_trait]
impl RegistryStore for FsRegistry {
  async fn upsert(&self, spec: &ContainerSpec) -> Result<UpsertOutcome, BuildError> {
    let _guard = self.write_lock.lock().await;
    let mut entries = self.read_entries().await?;

    let outcome = match entries.get(spec.signature.as_str()) {
      Some(existing) if existing == spec => return Ok(UpsertOutcome::Unchanged),
      Some(_) => UpsertOutcome::Updated,
      None => UpsertOutcome::Inserted,
    };

    entries.insert(spec.signature.to_string(), spec.clone());
    self.write_entries(&entries).await?;
    debug!(signature = %spec.signature, outcome = ?outcome, "registry entry written");
    Ok(outcome)
  }

  async fn get(&self, signature: &Signature) -> Result<Option<ContainerSpec>, BuildError> {
    Ok(self.read_entries().await?.remove(signature.as_str()))
  }

  async fn list(&self) -> Result<Vec<ContainerSpec>, BuildError> {
    Ok(self.read_entries().await?.into_values().collect())
  }
}
