//! Edge types for connecting nodes in an automation graph.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::NodeId;

/// Branch label on an edge leaving a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchLabel {
    /// Followed when the condition evaluates to true.
    True,
    /// Followed when the condition evaluates to false.
    False,
}

impl BranchLabel {
    /// Returns the label matching an evaluation result.
    pub const fn from_bool(matched: bool) -> Self {
        if matched {
            BranchLabel::True
        } else {
            BranchLabel::False
        }
    }
}

/// An edge connecting two nodes in the automation graph.
///
/// Edges leaving a condition node carry a [`BranchLabel`]; all other edges
/// are unlabeled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Builder)]
#[builder(
    name = "EdgeBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct Edge {
    /// Source node ID.
    pub from: NodeId,
    /// Target node ID.
    pub to: NodeId,
    /// Branch label, present only on edges leaving a condition node.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub label: Option<BranchLabel>,
}

impl EdgeBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.from.is_none() {
            return Err("from is required".into());
        }
        if self.to.is_none() {
            return Err("to is required".into());
        }
        Ok(())
    }
}

impl Edge {
    /// Creates a new unlabeled edge between two nodes.
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self {
            from,
            to,
            label: None,
        }
    }

    /// Creates a new labeled branch edge between two nodes.
    pub fn labeled(from: NodeId, to: NodeId, label: BranchLabel) -> Self {
        Self {
            from,
            to,
            label: Some(label),
        }
    }

    /// Returns a builder for creating an edge.
    pub fn builder() -> EdgeBuilder {
        EdgeBuilder::default()
    }
}
