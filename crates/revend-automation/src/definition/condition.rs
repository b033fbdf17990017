//! Condition node definition.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, IntoStaticStr};

/// How the results of multiple field conditions are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOperator {
    /// Every condition must hold.
    #[default]
    And,
    /// At least one condition must hold.
    Or,
}

/// Comparison operator applied to one field of the event snapshot.
///
/// Operators must be semantically valid for the field's value type;
/// evaluation fails closed (the condition is false) on a type mismatch
/// rather than raising an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompareOp {
    /// Field equals the comparison value.
    Equals,
    /// Field does not equal the comparison value.
    NotEquals,
    /// Field is numerically greater than the comparison value.
    GreaterThan,
    /// Field is numerically greater than or equal to the comparison value.
    GreaterOrEqual,
    /// Field is numerically less than the comparison value.
    LessThan,
    /// Field is numerically less than or equal to the comparison value.
    LessOrEqual,
    /// String field contains the comparison value as a substring, or array
    /// field contains it as an element.
    Contains,
    /// Negation of `contains`.
    NotContains,
    /// Field differs from its previous value.
    Changed,
    /// Field changed and its previous value equals the comparison value.
    ChangedFrom,
    /// Field changed and its current value equals the comparison value.
    ChangedTo,
}

/// A single comparison against one field of the event snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    /// Dotted path into the snapshot, e.g. `customer.riskScore`.
    pub path: String,
    /// The comparison to apply.
    pub operator: CompareOp,
    /// The comparison value. Unused by the `changed` operator.
    #[serde(default)]
    pub value: Value,
}

impl FieldCondition {
    /// Creates a new field condition.
    pub fn new(path: impl Into<String>, operator: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Condition node payload: a set of field conditions and the logic
/// operator combining them.
///
/// An empty condition list evaluates to true (an unconditional branch).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionDef {
    /// The field conditions to evaluate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<FieldCondition>,
    /// How individual results are combined.
    #[serde(default)]
    pub logic: LogicOperator,
}

impl ConditionDef {
    /// Creates a condition requiring all of the given comparisons to hold.
    pub fn all(conditions: Vec<FieldCondition>) -> Self {
        Self {
            conditions,
            logic: LogicOperator::And,
        }
    }

    /// Creates a condition requiring any of the given comparisons to hold.
    pub fn any(conditions: Vec<FieldCondition>) -> Self {
        Self {
            conditions,
            logic: LogicOperator::Or,
        }
    }
}
