//! Trigger node definition.

use revend_core::EventKind;
use serde::{Deserialize, Serialize};

/// Trigger node payload: the event kind this automation reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDef {
    /// The event kind that starts a walk of this graph.
    pub event: EventKind,
}

impl TriggerDef {
    /// Creates a new trigger for the given event kind.
    pub const fn new(event: EventKind) -> Self {
        Self { event }
    }

    /// Returns whether this trigger matches the given event kind.
    pub fn matches(&self, kind: EventKind) -> bool {
        self.event == kind
    }
}
