//! Shipwright Workflow
//!
//! This crate provides the validated workflow representation used for planning.
//! A [`Workflow`] is built from a `shipwright-config` definition and guarantees:
//! - Node IDs are unique and keep their definition order
//! - Every edge references existing nodes
//! - Resource allotments are well formed (positive CPU and memory)
//!
//! The [`Graph`] built from a workflow orders nodes topologically and rejects
//! cycles. Nodes carry an optional [`Signature`] slot that stays empty until the
//! signature pass fills it in.

mod edge;
mod error;
mod graph;
mod node;
mod signature;
mod workflow;

pub use edge::Edge;
pub use error::{ErrorKind, WorkflowError};
pub use graph::Graph;
pub use node::Node;
pub use shipwright_config::{IoFormat, TriggerType};
pub use signature::{Signature, TAG_LEN};
pub use workflow::Workflow;
