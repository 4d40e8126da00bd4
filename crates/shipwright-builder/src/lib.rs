//! Build and registration for Shipwright.
//!
//! This crate drives the two collaborators that turn a planned
//! [`ContainerSpec`] into a deployed artifact:
//! - an [`ImageBuilder`] that builds and pushes the image
//! - a [`RegistryStore`] that records the image against its signature
//!
//! The [`Coordinator`] treats every spec as an independent unit of work. Specs
//! run in parallel up to a configured limit, at most one build per image name
//! is in flight, and one failed build never cancels the others.

mod builder;
mod coordinator;
mod error;
mod registry;
mod result;

pub use builder::{DockerBuilder, ImageBuilder};
pub use coordinator::{Coordinator, CoordinatorConfig};
pub use error::BuildError;
pub use registry::{FsRegistry, RegistryStore, UpsertOutcome};
pub use result::{BuildOutcome, BuildReport, BuildStatus};

pub use shipwright_planner::ContainerSpec;
