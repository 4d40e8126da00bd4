use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shipwright_planner::ContainerSpec;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::BuildError;

/// Builds the image for a container spec and publishes it.
#[async_trait]
pub trait ImageBuilder: Send + Sync {
  /// Build `spec.image_name` and push it. Any failure must be returned, not
  /// swallowed.
  async fn build_and_push(&self, spec: &ContainerSpec) -> Result<(), BuildError>;
}

/// Builder backed by the `docker` command line.
///
/// Runs `docker build -t <image> <context>` and then `docker push <image>`.
pub struct DockerBuilder {
  program: String,
  context_dir: PathBuf,
  push: bool,
}

impl DockerBuilder {
  /// Create a builder that uses `context_dir` as the build context.
  pub fn new(context_dir: impl Into<PathBuf>) -> Self {
    Self {
      program: "docker".to_string(),
      context_dir: context_dir.into(),
      push: true,
    }
  }

  /// Use a different executable with the same command line, e.g. `podman`.
  pub fn with_program(mut self, program: impl Into<String>) -> Self {
    self.program = program.into();
    self
  }

  /// Skip the push step.
  pub fn with_push(mut self, push: bool) -> Self {
    self.push = push;
    self
  }

  pub fn context_dir(&self) -> &Path {
    &self.context_dir
  }

  async fn run(&self, args: &[&str]) -> Result<(), BuildError> {
    let command = format!("{} {}", self.program, args.join(" "));
    debug!(command = %command, "running build command");

    let output = Command::new(&self.program).args(args).output().await?;
    if !output.status.success() {
      return Err(BuildError::CommandFailed {
        command,
        status: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }
    Ok(())
  }
}

#[async_trait]
impl ImageBuilder for DockerBuilder {
  async fn build_and_push(&self, spec: &ContainerSpec) -> Result<(), BuildError> {
    let context = self.context_dir.to_string_lossy();
    self
      .run(&["build", "-t", spec.image_name.as_str(), &*context])
      .await?;
    info!(image = %spec.image_name, "image built");

    if self.push {
      self.run(&["push", spec.image_name.as_str()]).await?;
      info!(image = %spec.image_name, "image pushed");
    }
    Ok(())
  }
}
