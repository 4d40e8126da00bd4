//! Shipwright Config
//!
//! This crate contains the serializable workflow definition types for Shipwright.
//! These types represent a workflow graph as it arrives from the workflow source,
//! before it is validated and turned into the planning model by
//! `shipwright-workflow`.
//!
//! Definitions are usually loaded from JSON:
//!
//! ```json
//! {
//!   "workflow_id": "etl",
//!   "nodes": [
//!     { "id": "A", "type": "ingest", "runtime": "py3.10", "deps": [] },
//!     { "id": "C", "type": "train", "runtime": "cuda12.1", "deps": ["torch"],
//!       "needs_gpu": true, "cpu": 2, "mem_mb": 4096, "io_format": "parquet" }
//!   ],
//!   "edges": [{ "src": "A", "dst": "C" }]
//! }
//! ```
//!
//! Fields omitted from a node take the defaults of the workflow source
//! (0.5 cores, 512 MB, json I/O, event trigger).

mod edge;
mod enums;
mod node;
mod workflow;

pub use edge::EdgeDef;
pub use enums::{IoFormat, TriggerType};
pub use node::NodeDef;
pub use workflow::WorkflowDef;
