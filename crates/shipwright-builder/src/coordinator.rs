//! Parallel build and registration of container specs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use shipwright_planner::ContainerSpec;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::builder::ImageBuilder;
use crate::error::BuildError;
use crate::registry::{RegistryStore, UpsertOutcome};
use crate::result::{BuildOutcome, BuildReport, BuildStatus};

/// Configuration for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
  /// Maximum number of builds in flight at once.
  pub max_concurrency: usize,
}

impl Default for CoordinatorConfig {
  fn default() -> Self {
    Self { max_concurrency: 4 }
  }
}

/// Drives the image builder and registry for a set of container specs.
///
/// Each spec is an independent task. Builds sharing an image name are
/// serialized; everything else runs in parallel up to
/// [`CoordinatorConfig::max_concurrency`].
pub struct Coordinator<B, R> {
  builder: Arc<B>,
  registry: Arc<R>,
  config: CoordinatorConfig,
  image_locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<B, R> Coordinator<B, R>
where
  B: ImageBuilder + 'static,
  R: RegistryStore + 'static,
{
  pub fn new(builder: B, registry: R, config: CoordinatorConfig) -> Self {
    Self {
      builder: Arc::new(builder),
      registry: Arc::new(registry),
      config,
      image_locks: StdMutex::new(HashMap::new()),
    }
  }

  pub fn builder(&self) -> &B {
    &self.builder
  }

  pub fn registry(&self) -> &R {
    &self.registry
  }

  /// Build and register every spec.
  ///
  /// Never fails as a whole: each spec's result is reported in the returned
  /// [`BuildReport`], in the order the specs were given. Specs that have not
  /// started when `cancel` fires are reported as skipped.
  #[instrument(name = "coordinator_run", skip(self, specs, cancel), fields(specs = specs.len()))]
  pub async fn run(&self, specs: Vec<ContainerSpec>, cancel: CancellationToken) -> BuildReport {
    let permits = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));

    let handles: Vec<_> = specs
      .iter()
      .map(|spec| {
        let builder = Arc::clone(&self.builder);
        let registry = Arc::clone(&self.registry);
        let permits = Arc::clone(&permits);
        let image_lock = self.image_lock(&spec.image_name);
        let cancel = cancel.clone();
        let spec = spec.clone();

        tokio::spawn(async move {
          run_spec(
            builder.as_ref(),
            registry.as_ref(),
            &spec,
            permits,
            image_lock,
            cancel,
          )
          .await
        })
      })
      .collect();

    let results = futures::future::join_all(handles).await;

    let outcomes: Vec<BuildOutcome> = specs
      .into_iter()
      .zip(results)
      .map(|(spec, result)| {
        let status = result.unwrap_or_else(|e| BuildStatus::Failed {
          error: BuildError::Task(e.to_string()).to_string(),
        });
        BuildOutcome { spec, status }
      })
      .collect();

    self.release_idle_locks();

    let report = BuildReport { outcomes };
    info!(
      total = report.outcomes.len(),
      failed = report.failures().count(),
      "coordinator run finished"
    );
    report
  }

  /// The mutex guarding builds of one image name.
  fn image_lock(&self, image_name: &str) -> Arc<Mutex<()>> {
    let mut locks = self
      .image_locks
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(locks.entry(image_name.to_string()).or_default())
  }

  /// Forget image locks that no task holds anymore. Locks still cloned by a
  /// concurrent run survive.
  fn release_idle_locks(&self) {
    let mut locks = self
      .image_locks
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.retain(|_, lock| Arc::strong_count(lock) > 1);
  }
}

async fn run_spec<B, R>(
  builder: &B,
  registry: &R,
  spec: &ContainerSpec,
  permits: Arc<Semaphore>,
  image_lock: Arc<Mutex<()>>,
  cancel: CancellationToken,
) -> BuildStatus
where
  B: ImageBuilder + ?Sized,
  R: RegistryStore + ?Sized,
{
  let _image_guard = tokio::select! {
    biased;
    _ = cancel.cancelled() => return skipped(spec),
    guard = image_lock.lock_owned() => guard,
  };
  let _permit = tokio::select! {
    biased;
    _ = cancel.cancelled() => return skipped(spec),
    permit = permits.acquire_owned() => match permit {
      Ok(permit) => permit,
      Err(_) => return skipped(spec),
    },
  };

  match build_and_register(builder, registry, spec).await {
    Ok(outcome) => {
      info!(
        image = %spec.image_name,
        signature = %spec.signature,
        registry = ?outcome,
        "spec registered"
      );
      BuildStatus::Registered { registry: outcome }
    }
    Err(e) => {
      error!(
        image = %spec.image_name,
        signature = %spec.signature,
        error = %e,
        "spec failed"
      );
      BuildStatus::Failed {
        error: e.to_string(),
      }
    }
  }
}

/// Registration only happens after a successful build and push.
async fn build_and_register<B, R>(
  builder: &B,
  registry: &R,
  spec: &ContainerSpec,
) -> Result<UpsertOutcome, BuildError>
where
  B: ImageBuilder + ?Sized,
  R: RegistryStore + ?Sized,
{
  builder.build_and_push(spec).await?;
  registry.upsert(spec).await
}

fn skipped(spec: &ContainerSpec) -> BuildStatus {
  warn!(image = %spec.image_name, "build skipped, run cancelled");
  BuildStatus::Skipped
}
