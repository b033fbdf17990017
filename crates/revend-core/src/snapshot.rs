//! Event field snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity field values captured at the moment a domain event fired.
///
/// A snapshot is a JSON document keyed by entity name, e.g.
/// `{"return": {"status": "approved"}, "customer": {"riskScore": 90}}`.
/// When the mutation that produced the event replaced existing values, the
/// previous document is carried alongside so `changed`-style conditions can
/// compare against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    /// Field values at event time.
    pub current: Value,
    /// Field values before the mutation, when captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
}

impl EventSnapshot {
    /// Creates a snapshot of the current field values.
    pub fn new(current: Value) -> Self {
        Self {
            current,
            previous: None,
        }
    }

    /// Attaches the field values from before the mutation.
    pub fn with_previous(mut self, previous: Value) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Looks up a value in the current document by dotted path.
    ///
    /// Returns `None` when any segment of the path is absent.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.current, path)
    }

    /// Looks up a value in the previous document by dotted path.
    ///
    /// Returns `None` when no previous values were captured or the path
    /// is absent.
    pub fn lookup_previous(&self, path: &str) -> Option<&Value> {
        lookup_path(self.previous.as_ref()?, path)
    }

    /// Returns whether the value at `path` differs from its previous value.
    ///
    /// False when the path is absent from either document, including when
    /// no previous values were captured at all.
    pub fn changed(&self, path: &str) -> bool {
        match (self.lookup(path), self.lookup_previous(path)) {
            (Some(current), Some(previous)) => current != previous,
            _ => false,
        }
    }
}

/// Resolves a dotted path like `customer.riskScore` against a JSON value.
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
}
