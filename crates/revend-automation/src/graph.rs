//! Compiled automation graph.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use revend_core::TenantId;

use crate::definition::{Automation, AutomationId, BranchLabel, Node, NodeId};
use crate::error::{AutomationError, AutomationResult};

/// A walkable automation graph compiled from an [`Automation`] definition.
///
/// Internally uses petgraph's `DiGraph` for efficient traversal. Compiling
/// performs all structural validation, so a value of this type is known to
/// have exactly one trigger node, labeled edges only where a condition
/// branches, and no dangling edge endpoints. Cycles are not rejected here;
/// the walker guards against them with a per-walk visited set.
#[derive(Debug, Clone)]
pub struct AutomationGraph {
    automation_id: AutomationId,
    tenant_id: TenantId,
    /// The underlying directed graph; edge weights are branch labels.
    graph: DiGraph<Node, Option<BranchLabel>>,
    /// Mapping from NodeId to petgraph's NodeIndex.
    node_indices: HashMap<NodeId, NodeIndex>,
    /// Reverse mapping from NodeIndex to NodeId.
    index_to_id: HashMap<NodeIndex, NodeId>,
    /// The unique trigger node.
    trigger: NodeId,
}

impl AutomationGraph {
    /// Compiles a definition into a walkable graph.
    ///
    /// Validates that:
    /// - The graph has at least one node
    /// - Exactly one node is a trigger, and no edge targets it
    /// - Every edge references existing nodes
    /// - Condition nodes have at most two outgoing edges, each labeled,
    ///   with distinct labels
    /// - All other nodes have at most one outgoing edge, unlabeled
    /// - Every non-trigger node is reachable from the trigger
    pub fn compile(automation: &Automation) -> AutomationResult<Self> {
        if automation.nodes.is_empty() {
            return Err(AutomationError::InvalidGraph(
                "automation must have at least one node".into(),
            ));
        }

        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut index_to_id = HashMap::new();
        let mut trigger = None;

        for (&id, node) in &automation.nodes {
            if node.is_trigger() {
                if trigger.replace(id).is_some() {
                    return Err(AutomationError::InvalidGraph(
                        "automation must have exactly one trigger node".into(),
                    ));
                }
            }
            let index = graph.add_node(node.clone());
            node_indices.insert(id, index);
            index_to_id.insert(index, id);
        }

        let Some(trigger) = trigger else {
            return Err(AutomationError::InvalidGraph(
                "automation must have exactly one trigger node".into(),
            ));
        };

        for edge in &automation.edges {
            let from_index = node_indices.get(&edge.from).ok_or_else(|| {
                AutomationError::InvalidGraph(format!("source node {} does not exist", edge.from))
            })?;
            let to_index = node_indices.get(&edge.to).ok_or_else(|| {
                AutomationError::InvalidGraph(format!("target node {} does not exist", edge.to))
            })?;
            if edge.to == trigger {
                return Err(AutomationError::InvalidGraph(format!(
                    "trigger node {} must not have incoming edges",
                    trigger
                )));
            }
            graph.add_edge(*from_index, *to_index, edge.label);
        }

        let compiled = Self {
            automation_id: automation.id,
            tenant_id: automation.tenant_id,
            graph,
            node_indices,
            index_to_id,
            trigger,
        };
        compiled.validate_edges()?;
        compiled.validate_reachability()?;
        Ok(compiled)
    }

    /// Checks the out-degree and label discipline of every node.
    fn validate_edges(&self) -> AutomationResult<()> {
        for index in self.graph.node_indices() {
            let node_id = self.index_to_id[&index];
            let node = &self.graph[index];
            let outgoing: Vec<_> = self
                .graph
                .edges_directed(index, Direction::Outgoing)
                .map(|edge_ref| *edge_ref.weight())
                .collect();

            if node.is_condition() {
                if outgoing.len() > 2 {
                    return Err(AutomationError::InvalidGraph(format!(
                        "condition node {} has more than two outgoing edges",
                        node_id
                    )));
                }
                let mut seen = Vec::new();
                for label in &outgoing {
                    let Some(label) = label else {
                        return Err(AutomationError::InvalidGraph(format!(
                            "edge leaving condition node {} must carry a branch label",
                            node_id
                        )));
                    };
                    if seen.contains(label) {
                        return Err(AutomationError::InvalidGraph(format!(
                            "condition node {} has duplicate {:?} branches",
                            node_id, label
                        )));
                    }
                    seen.push(*label);
                }
            } else {
                if outgoing.len() > 1 {
                    return Err(AutomationError::InvalidGraph(format!(
                        "node {} has more than one outgoing edge",
                        node_id
                    )));
                }
                if outgoing.iter().any(Option::is_some) {
                    return Err(AutomationError::InvalidGraph(format!(
                        "edge leaving non-condition node {} must not carry a branch label",
                        node_id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that every non-trigger node is reachable from the trigger.
    fn validate_reachability(&self) -> AutomationResult<()> {
        let start = self.node_indices[&self.trigger];
        let mut reachable = vec![false; self.graph.node_count()];
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(index) = dfs.next(&self.graph) {
            reachable[index.index()] = true;
        }

        for index in self.graph.node_indices() {
            if !reachable[index.index()] {
                return Err(AutomationError::InvalidGraph(format!(
                    "node {} is not reachable from the trigger",
                    self.index_to_id[&index]
                )));
            }
        }
        Ok(())
    }

    /// Returns the automation's ID.
    pub fn automation_id(&self) -> AutomationId {
        self.automation_id
    }

    /// Returns the tenant owning the automation.
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the ID of the trigger node.
    pub fn trigger(&self) -> NodeId {
        self.trigger
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns whether a node exists.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_indices.contains_key(&id)
    }

    /// Returns a reference to a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        let index = self.node_indices.get(&id)?;
        self.graph.node_weight(*index)
    }

    /// Returns the target of a node's single unlabeled outgoing edge.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        let index = self.node_indices.get(&id)?;
        self.graph
            .edges_directed(*index, Direction::Outgoing)
            .find(|edge_ref| edge_ref.weight().is_none())
            .and_then(|edge_ref| self.index_to_id.get(&edge_ref.target()).copied())
    }

    /// Returns the target of the branch edge matching an evaluation result.
    pub fn branch(&self, id: NodeId, matched: bool) -> Option<NodeId> {
        let index = self.node_indices.get(&id)?;
        let label = BranchLabel::from_bool(matched);
        self.graph
            .edges_directed(*index, Direction::Outgoing)
            .find(|edge_ref| *edge_ref.weight() == Some(label))
            .and_then(|edge_ref| self.index_to_id.get(&edge_ref.target()).copied())
    }
}
