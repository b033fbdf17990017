//! Node definition types.

use std::str::FromStr;

use derive_builder::Builder;
use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action::ActionDef;
use super::condition::ConditionDef;
use super::delay::DelayDef;
use super::trigger::TriggerDef;

/// Unique identifier for a node in an automation graph.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Creates a new random node ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a node ID from an existing UUID.
    #[inline]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the UUID as bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

impl AsRef<Uuid> for NodeId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

/// An automation node definition with metadata and kind.
///
/// Nodes are categorized by their role in a walk:
/// - **Trigger**: the graph's unique entry point, bound to one event kind
/// - **Condition**: a boolean branch point evaluated against the snapshot
/// - **Action**: performs one externally-visible side effect
/// - **Delay**: suspends the walk for a duration before resuming
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(
    name = "NodeBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with")
)]
pub struct Node {
    /// Display name of the node.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub name: Option<String>,
    /// Description of what this node does.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub description: Option<String>,
    /// The node kind/type.
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    /// Creates a new node with the given kind.
    pub fn new(kind: impl Into<NodeKind>) -> Self {
        Self {
            name: None,
            description: None,
            kind: kind.into(),
        }
    }

    /// Returns a builder for creating a node.
    pub fn builder() -> NodeBuilder {
        NodeBuilder::default()
    }

    /// Returns whether this is a trigger node.
    pub const fn is_trigger(&self) -> bool {
        self.kind.is_trigger()
    }

    /// Returns whether this is a condition node.
    pub const fn is_condition(&self) -> bool {
        self.kind.is_condition()
    }

    /// Returns whether this is an action node.
    pub const fn is_action(&self) -> bool {
        self.kind.is_action()
    }

    /// Returns whether this is a delay node.
    pub const fn is_delay(&self) -> bool {
        self.kind.is_delay()
    }
}

impl From<NodeKind> for Node {
    fn from(kind: NodeKind) -> Self {
        Node::new(kind)
    }
}

impl From<TriggerDef> for Node {
    fn from(def: TriggerDef) -> Self {
        Node::new(NodeKind::Trigger(def))
    }
}

impl From<ConditionDef> for Node {
    fn from(def: ConditionDef) -> Self {
        Node::new(NodeKind::Condition(def))
    }
}

impl From<ActionDef> for Node {
    fn from(def: ActionDef) -> Self {
        Node::new(NodeKind::Action(def))
    }
}

impl From<DelayDef> for Node {
    fn from(def: DelayDef) -> Self {
        Node::new(NodeKind::Delay(def))
    }
}

/// Node kind enum for automation graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, From)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Entry point node, matches one domain event kind.
    Trigger(TriggerDef),
    /// Boolean branch point over the event snapshot.
    Condition(ConditionDef),
    /// Side-effecting node.
    Action(ActionDef),
    /// Timed suspension node.
    Delay(DelayDef),
}

impl NodeKind {
    /// Returns whether this is a trigger node.
    pub const fn is_trigger(&self) -> bool {
        matches!(self, NodeKind::Trigger(_))
    }

    /// Returns whether this is a condition node.
    pub const fn is_condition(&self) -> bool {
        matches!(self, NodeKind::Condition(_))
    }

    /// Returns whether this is an action node.
    pub const fn is_action(&self) -> bool {
        matches!(self, NodeKind::Action(_))
    }

    /// Returns whether this is a delay node.
    pub const fn is_delay(&self) -> bool {
        matches!(self, NodeKind::Delay(_))
    }
}
