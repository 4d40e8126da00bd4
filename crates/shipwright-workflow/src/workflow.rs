use std::collections::HashMap;

use shipwright_config::WorkflowDef;

use crate::edge::Edge;
use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::node::Node;
use crate::signature::Signature;

/// A validated workflow ready for planning.
///
/// Nodes keep the order in which they were defined; this order breaks ties in
/// the topological ordering and decides group membership order.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
  pub workflow_id: String,
  pub name: Option<String>,
  nodes: Vec<Node>,
  index: HashMap<String, usize>,
  edges: Vec<Edge>,
}

impl Workflow {
  /// Build a workflow, checking node ID uniqueness and edge endpoints.
  pub fn new(
    workflow_id: impl Into<String>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
  ) -> Result<Self, WorkflowError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
      if index.insert(node.id().to_string(), position).is_some() {
        return Err(WorkflowError::DuplicateNodeId {
          node_id: node.id().to_string(),
        });
      }
    }

    for edge in &edges {
      if !index.contains_key(&edge.src) || !index.contains_key(&edge.dst) {
        return Err(WorkflowError::InvalidEdge {
          from: edge.src.clone(),
          to: edge.dst.clone(),
        });
      }
    }

    Ok(Self {
      workflow_id: workflow_id.into(),
      name: None,
      nodes,
      index,
      edges,
    })
  }

  /// Validate a definition into a workflow.
  pub fn from_def(def: WorkflowDef) -> Result<Self, WorkflowError> {
    let nodes = def
      .nodes
      .into_iter()
      .map(Node::from_def)
      .collect::<Result<Vec<_>, _>>()?;
    let edges = def
      .edges
      .into_iter()
      .map(Edge::from_def)
      .collect::<Result<Vec<_>, _>>()?;

    let mut workflow = Self::new(def.workflow_id, nodes, edges)?;
    workflow.name = def.name;
    Ok(workflow)
  }

  /// Build the graph structure for ordering and traversal.
  pub fn graph(&self) -> Graph {
    Graph::new(self.node_ids(), &self.edges)
  }

  /// Nodes in definition order.
  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  /// Attach a signature to one node. This is the only write a node accepts
  /// after ingestion.
  pub fn attach_signature(
    &mut self,
    node_id: &str,
    signature: Signature,
  ) -> Result<(), WorkflowError> {
    let position = *self
      .index
      .get(node_id)
      .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))?;
    self.nodes[position].attach_signature(signature)
  }

  pub fn node_ids(&self) -> impl Iterator<Item = &str> {
    self.nodes.iter().map(Node::id)
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&Node> {
    self.index.get(node_id).map(|&position| &self.nodes[position])
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }
}

impl TryFrom<WorkflowDef> for Workflow {
  type Error = WorkflowError;

  fn try_from(def: WorkflowDef) -> Result<Self, Self::Error> {
    Self::from_def(def)
  }
}
