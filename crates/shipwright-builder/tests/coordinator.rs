//! Coordinator behaviour against a recording builder and a filesystem registry.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use shipwright_builder::{
  BuildError, BuildStatus, ContainerSpec, Coordinator, CoordinatorConfig, FsRegistry,
  ImageBuilder, RegistryStore, UpsertOutcome,
};
use shipwright_planner::Signature;
use tokio_util::sync::CancellationToken;

/// Builder that sleeps briefly and records how many builds overlap.
#[derive(Default)]
struct RecordingBuilder {
  failing: HashSet<String>,
  state: Mutex<State>,
}

#[derive(Default)]
struct State {
  in_flight: usize,
  max_in_flight: usize,
  per_image: HashMap<String, usize>,
  max_per_image: usize,
  built: Vec<String>,
}

impl RecordingBuilder {
  fn failing(images: &[&str]) -> Self {
    Self {
      failing: images.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    }
  }
}

#[async_trait]
impl ImageBuilder for RecordingBuilder {
  async fn build_and_push(&self, spec: &ContainerSpec) -> Result<(), BuildError> {
    {
      let mut state = self.state.lock().unwrap();
      state.in_flight += 1;
      state.max_in_flight = state.max_in_flight.max(state.in_flight);
      let count = state.per_image.entry(spec.image_name.clone()).or_insert(0);
      *count += 1;
      let count = *count;
      state.max_per_image = state.max_per_image.max(count);
    }

    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    if let Some(count) = state.per_image.get_mut(&spec.image_name) {
      *count -= 1;
    }

    if self.failing.contains(&spec.image_name) {
      return Err(BuildError::CommandFailed {
        command: format!("docker build -t {} .", spec.image_name),
        status: Some(1),
        stderr: "boom".to_string(),
      });
    }
    state.built.push(spec.image_name.clone());
    Ok(())
  }
}

fn spec(signature: &str, image_name: &str) -> ContainerSpec {
  ContainerSpec {
    signature: Signature::new(signature),
    node_ids: vec![format!("node-{}", signature)],
    image_name: image_name.to_string(),
  }
}

fn specs(count: usize) -> Vec<ContainerSpec> {
  (0..count)
    .map(|i| spec(&format!("sig{:04}", i), &format!("step:{:08}", i)))
    .collect()
}

#[tokio::test]
async fn test_all_specs_registered() {
  let dir = tempfile::tempdir().unwrap();
  let coordinator = Coordinator::new(
    RecordingBuilder::default(),
    FsRegistry::new(dir.path()),
    CoordinatorConfig::default(),
  );

  let report = coordinator.run(specs(3), CancellationToken::new()).await;

  assert!(report.is_success());
  assert_eq!(report.outcomes.len(), 3);
  for outcome in &report.outcomes {
    assert_eq!(
      outcome.status,
      BuildStatus::Registered {
        registry: UpsertOutcome::Inserted
      }
    );
  }
  assert_eq!(coordinator.registry().list().await.unwrap().len(), 3);

  let again = coordinator.run(specs(3), CancellationToken::new()).await;
  let unchanged = BuildStatus::Registered {
    registry: UpsertOutcome::Unchanged,
  };
  assert!(again.outcomes.iter().all(|o| o.status == unchanged));
}

#[tokio::test]
async fn test_failure_does_not_cancel_other_builds() {
  let dir = tempfile::tempdir().unwrap();
  let coordinator = Coordinator::new(
    RecordingBuilder::failing(&["step:00000001"]),
    FsRegistry::new(dir.path()),
    CoordinatorConfig::default(),
  );

  let report = coordinator.run(specs(3), CancellationToken::new()).await;

  assert!(!report.is_success());
  assert_eq!(report.failures().count(), 1);
  assert!(matches!(
    report.outcomes[1].status,
    BuildStatus::Failed { ref error } if error.contains("boom")
  ));
  assert!(matches!(
    report.outcomes[0].status,
    BuildStatus::Registered { .. }
  ));
  assert!(matches!(
    report.outcomes[2].status,
    BuildStatus::Registered { .. }
  ));

  let registry = coordinator.registry();
  assert!(
    registry
      .get(&Signature::new("sig0001"))
      .await
      .unwrap()
      .is_none()
  );
  assert_eq!(registry.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrency_limit() {
  let dir = tempfile::tempdir().unwrap();
  let coordinator = Coordinator::new(
    RecordingBuilder::default(),
    FsRegistry::new(dir.path()),
    CoordinatorConfig { max_concurrency: 2 },
  );

  let report = coordinator.run(specs(6), CancellationToken::new()).await;

  assert!(report.is_success());
  let builder_state = coordinator_state(&coordinator);
  assert!(builder_state.0 <= 2, "max in flight was {}", builder_state.0);
  assert_eq!(builder_state.1, 6);
}

#[tokio::test]
async fn test_one_build_per_image_name() {
  let dir = tempfile::tempdir().unwrap();
  let coordinator = Coordinator::new(
    RecordingBuilder::default(),
    FsRegistry::new(dir.path()),
    CoordinatorConfig { max_concurrency: 8 },
  );

  // Distinct signatures whose tags collide on the same image name.
  let colliding = vec![
    spec("abcd1234aaaa", "ingest:abcd1234"),
    spec("abcd1234bbbb", "ingest:abcd1234"),
    spec("abcd1234cccc", "ingest:abcd1234"),
  ];
  let report = coordinator.run(colliding, CancellationToken::new()).await;

  assert!(report.is_success());
  let state = coordinator_state(&coordinator);
  assert_eq!(state.1, 3);
  assert_eq!(state.2, 1);
}

#[tokio::test]
async fn test_cancelled_run_skips_everything() {
  let dir = tempfile::tempdir().unwrap();
  let coordinator = Coordinator::new(
    RecordingBuilder::default(),
    FsRegistry::new(dir.path()),
    CoordinatorConfig::default(),
  );

  let cancel = CancellationToken::new();
  cancel.cancel();
  let report = coordinator.run(specs(4), cancel).await;

  assert!(
    report
      .outcomes
      .iter()
      .all(|o| o.status == BuildStatus::Skipped)
  );
  assert!(coordinator.registry().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_report_serializes_with_status_tag() {
  let dir = tempfile::tempdir().unwrap();
  let coordinator = Coordinator::new(
    RecordingBuilder::default(),
    FsRegistry::new(dir.path()),
    CoordinatorConfig::default(),
  );

  let report = coordinator
    .run(vec![spec("sig", "step:sig")], CancellationToken::new())
    .await;
  let value = serde_json::to_value(&report).unwrap();

  assert_eq!(value["outcomes"][0]["status"], "registered");
  assert_eq!(value["outcomes"][0]["registry"], "inserted");
  assert_eq!(value["outcomes"][0]["spec"]["image_name"], "step:sig");
}

/// (max in flight, images built, max concurrent builds of one image)
fn coordinator_state(
  coordinator: &Coordinator<RecordingBuilder, FsRegistry>,
) -> (usize, usize, usize) {
  let state = coordinator.builder().state.lock().unwrap();
  (state.max_in_flight, state.built.len(), state.max_per_image)
}
