//! Shipwright Planner
//!
//! Turns a validated [`Workflow`] into the set of container builds needed to
//! deploy it:
//! - [`compute_signature`] / [`sign_workflow`] derive a content hash from each
//!   node's build-relevant requirements
//! - [`plan_groups`] partitions nodes by identical signature
//! - [`generate_container_specs`] names one image per group
//! - [`CompatibilityRules`] checks declared data contracts on edges
//!
//! [`Planner`] runs all of the above as a single pass and either returns a
//! complete [`Plan`] or an error, never a partial plan.

mod contract;
mod grouping;
mod planner;
mod signature;
mod spec;

pub use contract::{
  CompatRule, Compatibility, CompatibilityRules, ContractWarning, RuleError, validate_contracts,
};
pub use grouping::{BuildGroup, plan_groups};
pub use planner::{Plan, Planner};
pub use signature::{compute_signature, sign_workflow};
pub use spec::{ContainerSpec, generate_container_specs};

pub use shipwright_workflow::{ErrorKind, Signature, Workflow, WorkflowError};
