use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::edge::Edge;
use crate::error::WorkflowError;

/// Graph structure for ordering and traversal.
///
/// Built once per validation call from the workflow's node IDs and edges.
#[derive(Debug, Clone)]
pub struct Graph {
  /// Node IDs in definition order.
  nodes: Vec<String>,
  /// Definition position of each node, used to break ordering ties.
  position: HashMap<String, usize>,
  /// Adjacency list: node_id -> list of downstream node_ids.
  adjacency: HashMap<String, Vec<String>>,
  /// Number of incoming edges per node.
  in_degree: HashMap<String, usize>,
}

impl Graph {
  /// Build a graph from node IDs and edges.
  ///
  /// Edge endpoints are expected to be among `node_ids`; [`crate::Workflow`]
  /// enforces this before a graph is ever built.
  pub fn new<'a>(node_ids: impl IntoIterator<Item = &'a str>, edges: &[Edge]) -> Self {
    let nodes: Vec<String> = node_ids.into_iter().map(str::to_string).collect();
    let position = nodes
      .iter()
      .enumerate()
      .map(|(idx, id)| (id.clone(), idx))
      .collect();

    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut in_degree: HashMap<String, usize> = HashMap::new();

    // Nodes absent from every edge still start at in-degree 0
    for node_id in &nodes {
      adjacency.entry(node_id.clone()).or_default();
      in_degree.entry(node_id.clone()).or_insert(0);
    }

    for edge in edges {
      adjacency
        .entry(edge.src.clone())
        .or_default()
        .push(edge.dst.clone());
      *in_degree.entry(edge.dst.clone()).or_insert(0) += 1;
    }

    Self {
      nodes,
      position,
      adjacency,
      in_degree,
    }
  }

  /// Order all nodes so that every edge's source precedes its destination.
  ///
  /// Uses Kahn's algorithm with a FIFO ready queue. Nodes that become ready at
  /// the same time are enqueued in definition order, so the result is
  /// deterministic. Fails with [`WorkflowError::CycleDetected`] listing every
  /// node that could not be ordered; no partial order is returned.
  pub fn topological_order(&self) -> Result<Vec<String>, WorkflowError> {
    let mut in_degree = self.in_degree.clone();
    let mut ready: VecDeque<&str> = self
      .nodes
      .iter()
      .filter(|id| in_degree.get(*id).copied().unwrap_or(0) == 0)
      .map(String::as_str)
      .collect();

    let mut order = Vec::with_capacity(self.nodes.len());
    while let Some(node_id) = ready.pop_front() {
      order.push(node_id.to_string());

      let mut released: Vec<&str> = Vec::new();
      for next in self.downstream(node_id) {
        if let Some(degree) = in_degree.get_mut(next) {
          *degree = degree.saturating_sub(1);
          if *degree == 0 {
            released.push(next.as_str());
          }
        }
      }
      released.sort_by_key(|id| self.position.get(*id).copied().unwrap_or(usize::MAX));
      ready.extend(released);
    }

    if order.len() < self.nodes.len() {
      let ordered: HashSet<&str> = order.iter().map(String::as_str).collect();
      let unordered: Vec<String> = self
        .nodes
        .iter()
        .filter(|id| !ordered.contains(id.as_str()))
        .cloned()
        .collect();
      debug!(unordered = ?unordered, "cycle detected during ordering");
      return Err(WorkflowError::CycleDetected { unordered });
    }

    Ok(order)
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}
