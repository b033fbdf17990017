//! Automation definition types.
//!
//! This module contains serializable, authoring-friendly types for defining
//! automations. These types are designed for:
//! - Easy serialization to/from JSON
//! - Editing through the authoring surface
//! - Storage in databases
//!
//! To walk an automation against an event, a definition is compiled into an
//! [`crate::AutomationGraph`], which performs the structural validation.

use std::collections::HashMap;
use std::str::FromStr;

use derive_more::{Debug, Display, From, Into};
use revend_core::{EventKind, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod action;
mod condition;
mod delay;
mod edge;
mod metadata;
mod node;
mod trigger;

pub use action::{
    ActionDef, CreateTicketAction, SendNotificationAction, TagAction, TransitionStatusAction,
    UpdateFieldAction,
};
pub use condition::{CompareOp, ConditionDef, FieldCondition, LogicOperator};
pub use delay::{DelayDef, DelayUnit};
pub use edge::{BranchLabel, Edge, EdgeBuilder};
pub use metadata::AutomationMetadata;
pub use node::{Node, NodeBuilder, NodeId, NodeKind};
pub use trigger::TriggerDef;

use crate::error::AutomationResult;
use crate::graph::AutomationGraph;

/// Unique identifier for an automation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct AutomationId(Uuid);

impl AutomationId {
    /// Creates a new random automation ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an automation ID from an existing UUID.
    #[inline]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AutomationId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for AutomationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

impl AsRef<Uuid> for AutomationId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

/// Serializable automation definition.
///
/// This is the JSON-friendly representation of one authored rule: its
/// nodes keyed by ID, the directed edges connecting them, and descriptive
/// metadata. The engine loads definitions read-only at event time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Automation {
    /// Unique automation ID.
    pub id: AutomationId,
    /// The tenant owning this automation.
    pub tenant_id: TenantId,
    /// Whether the automation participates in dispatch.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Nodes in the automation, keyed by their ID.
    pub nodes: HashMap<NodeId, Node>,
    /// Edges connecting nodes.
    pub edges: Vec<Edge>,
    /// Automation metadata.
    #[serde(default)]
    pub metadata: AutomationMetadata,
}

fn default_enabled() -> bool {
    true
}

impl Automation {
    /// Creates a new empty, enabled automation for the given tenant.
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            id: AutomationId::new(),
            tenant_id,
            enabled: true,
            nodes: HashMap::new(),
            edges: Vec::new(),
            metadata: AutomationMetadata::default(),
        }
    }

    /// Adds a node and returns its generated ID.
    pub fn add_node(&mut self, node: impl Into<Node>) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(id, node.into());
        id
    }

    /// Connects two nodes with an unlabeled edge.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.edges.push(Edge::new(from, to));
    }

    /// Connects two nodes with a labeled branch edge.
    pub fn connect_branch(&mut self, from: NodeId, to: NodeId, label: BranchLabel) {
        self.edges.push(Edge::labeled(from, to, label));
    }

    /// Returns the event kind of the automation's trigger node, if present.
    pub fn trigger_event(&self) -> Option<EventKind> {
        self.nodes.values().find_map(|node| match &node.kind {
            NodeKind::Trigger(trigger) => Some(trigger.event),
            _ => None,
        })
    }

    /// Compiles the definition into a walkable graph, validating its
    /// structure.
    pub fn compile(&self) -> AutomationResult<AutomationGraph> {
        AutomationGraph::compile(self)
    }

    /// Deserializes an automation from JSON.
    pub fn from_json(json: &str) -> AutomationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the automation to JSON.
    pub fn to_json(&self) -> AutomationResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
