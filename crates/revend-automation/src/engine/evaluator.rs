//! Condition evaluation.
//!
//! Evaluation is pure and deterministic for a given snapshot; it performs
//! no I/O and never fails. Any ambiguity (a missing field path, a type
//! mismatch, a `changed` operator without captured previous values)
//! resolves the individual condition to false instead of raising.

use std::cmp::Ordering;

use revend_core::DomainEvent;
use serde_json::Value;

use crate::definition::{CompareOp, FieldCondition, LogicOperator};

/// Evaluates a set of field conditions against an event's snapshot.
///
/// An empty condition list evaluates to true: no conditions means an
/// unconditional branch.
pub fn evaluate(conditions: &[FieldCondition], logic: LogicOperator, event: &DomainEvent) -> bool {
    match logic {
        LogicOperator::And => conditions
            .iter()
            .all(|condition| evaluate_condition(condition, event)),
        LogicOperator::Or => {
            conditions.is_empty()
                || conditions
                    .iter()
                    .any(|condition| evaluate_condition(condition, event))
        }
    }
}

/// Evaluates one field condition.
fn evaluate_condition(condition: &FieldCondition, event: &DomainEvent) -> bool {
    let snapshot = &event.snapshot;
    let current = snapshot.lookup(&condition.path);

    match condition.operator {
        CompareOp::Equals => current.is_some_and(|value| values_equal(value, &condition.value)),
        CompareOp::NotEquals => current.is_some_and(|value| !values_equal(value, &condition.value)),
        CompareOp::GreaterThan => {
            compare_numbers(current, &condition.value).is_some_and(Ordering::is_gt)
        }
        CompareOp::GreaterOrEqual => {
            compare_numbers(current, &condition.value).is_some_and(Ordering::is_ge)
        }
        CompareOp::LessThan => {
            compare_numbers(current, &condition.value).is_some_and(Ordering::is_lt)
        }
        CompareOp::LessOrEqual => {
            compare_numbers(current, &condition.value).is_some_and(Ordering::is_le)
        }
        CompareOp::Contains => current.is_some_and(|value| contains(value, &condition.value)),
        CompareOp::NotContains => current.is_some_and(|value| !contains(value, &condition.value)),
        CompareOp::Changed => snapshot.changed(&condition.path),
        CompareOp::ChangedFrom => {
            match (current, snapshot.lookup_previous(&condition.path)) {
                (Some(current), Some(previous)) => {
                    values_equal(previous, &condition.value) && !values_equal(current, previous)
                }
                _ => false,
            }
        }
        CompareOp::ChangedTo => match (current, snapshot.lookup_previous(&condition.path)) {
            (Some(current), Some(previous)) => {
                values_equal(current, &condition.value) && !values_equal(current, previous)
            }
            _ => false,
        },
    }
}

/// Value equality with numeric normalization, so `90` equals `90.0`.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(left), Some(right)) => left == right,
        _ => left == right,
    }
}

/// Numeric comparison; `None` when either side is not a number.
fn compare_numbers(current: Option<&Value>, target: &Value) -> Option<Ordering> {
    let current = current?.as_f64()?;
    let target = target.as_f64()?;
    current.partial_cmp(&target)
}

/// Substring match on strings, membership on arrays, false elsewhere.
fn contains(current: &Value, target: &Value) -> bool {
    match current {
        Value::String(text) => target.as_str().is_some_and(|needle| text.contains(needle)),
        Value::Array(items) => items.iter().any(|item| values_equal(item, target)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use revend_core::{EntityId, EntityKind, EntityRef, EventKind, EventSnapshot, TenantId};
    use serde_json::json;

    use super::*;

    fn event(current: Value) -> DomainEvent {
        DomainEvent::new(
            TenantId::new(),
            EventKind::ReturnStatusChanged,
            EntityRef::new(EntityKind::Return, EntityId::new()),
            EventSnapshot::new(current),
        )
    }

    fn event_with_previous(current: Value, previous: Value) -> DomainEvent {
        let mut event = event(current);
        event.snapshot = event.snapshot.with_previous(previous);
        event
    }

    fn cond(path: &str, operator: CompareOp, value: Value) -> FieldCondition {
        FieldCondition::new(path, operator, value)
    }

    #[test]
    fn test_empty_conditions_are_true() {
        let event = event(json!({}));
        assert!(evaluate(&[], LogicOperator::And, &event));
        assert!(evaluate(&[], LogicOperator::Or, &event));
    }

    #[test]
    fn test_and_requires_all() {
        let event = event(json!({"return": {"status": "approved", "items": 3}}));
        let approved = cond("return.status", CompareOp::Equals, json!("approved"));
        let many_items = cond("return.items", CompareOp::GreaterThan, json!(2));
        let few_items = cond("return.items", CompareOp::LessThan, json!(2));

        assert!(evaluate(
            &[approved.clone(), many_items],
            LogicOperator::And,
            &event
        ));
        assert!(!evaluate(&[approved, few_items], LogicOperator::And, &event));
    }

    #[test]
    fn test_or_requires_any() {
        let event = event(json!({"return": {"status": "approved"}}));
        let approved = cond("return.status", CompareOp::Equals, json!("approved"));
        let rejected = cond("return.status", CompareOp::Equals, json!("rejected"));

        assert!(evaluate(
            &[rejected.clone(), approved],
            LogicOperator::Or,
            &event
        ));
        assert!(!evaluate(&[rejected], LogicOperator::Or, &event));
    }

    #[test]
    fn test_missing_path_is_false() {
        let event = event(json!({"return": {"status": "approved"}}));
        for operator in [
            CompareOp::Equals,
            CompareOp::NotEquals,
            CompareOp::GreaterThan,
            CompareOp::Contains,
            CompareOp::NotContains,
            CompareOp::Changed,
        ] {
            let condition = cond("return.carrier", operator, json!("dhl"));
            assert!(
                !evaluate(&[condition], LogicOperator::And, &event),
                "{:?} on a missing path must be false",
                operator
            );
        }
    }

    #[test]
    fn test_numeric_comparisons() {
        let event = event(json!({"customer": {"riskScore": 90}}));
        let gt = |value| cond("customer.riskScore", CompareOp::GreaterThan, value);

        assert!(evaluate(&[gt(json!(80))], LogicOperator::And, &event));
        assert!(!evaluate(&[gt(json!(90))], LogicOperator::And, &event));
        assert!(evaluate(
            &[cond("customer.riskScore", CompareOp::GreaterOrEqual, json!(90))],
            LogicOperator::And,
            &event
        ));
        assert!(evaluate(
            &[cond("customer.riskScore", CompareOp::LessOrEqual, json!(90.0))],
            LogicOperator::And,
            &event
        ));
        assert!(!evaluate(
            &[cond("customer.riskScore", CompareOp::LessThan, json!(90))],
            LogicOperator::And,
            &event
        ));
    }

    #[test]
    fn test_numeric_comparison_fails_closed_on_type_mismatch() {
        // The score is a string here; ordering against a number is
        // undefined and must resolve to false, not an error.
        let event = event(json!({"customer": {"riskScore": "90"}}));
        let condition = cond("customer.riskScore", CompareOp::GreaterThan, json!(80));
        assert!(!evaluate(&[condition], LogicOperator::And, &event));
    }

    #[test]
    fn test_equals_normalizes_numbers() {
        let event = event(json!({"customer": {"riskScore": 90}}));
        let condition = cond("customer.riskScore", CompareOp::Equals, json!(90.0));
        assert!(evaluate(&[condition], LogicOperator::And, &event));
    }

    #[test]
    fn test_contains_on_strings_and_arrays() {
        let event = event(json!({
            "return": {"reason": "arrived damaged", "tags": ["fragile", "priority"]}
        }));

        assert!(evaluate(
            &[cond("return.reason", CompareOp::Contains, json!("damaged"))],
            LogicOperator::And,
            &event
        ));
        assert!(evaluate(
            &[cond("return.tags", CompareOp::Contains, json!("priority"))],
            LogicOperator::And,
            &event
        ));
        assert!(evaluate(
            &[cond("return.tags", CompareOp::NotContains, json!("oversized"))],
            LogicOperator::And,
            &event
        ));
        // Contains on a number is a type mismatch.
        let event = event_with_previous(json!({"return": {"items": 3}}), json!({}));
        assert!(!evaluate(
            &[cond("return.items", CompareOp::Contains, json!(3))],
            LogicOperator::And,
            &event
        ));
    }

    #[test]
    fn test_changed_operators() {
        let event = event_with_previous(
            json!({"return": {"status": "approved", "items": 3}}),
            json!({"return": {"status": "requested", "items": 3}}),
        );

        assert!(evaluate(
            &[cond("return.status", CompareOp::Changed, Value::Null)],
            LogicOperator::And,
            &event
        ));
        assert!(!evaluate(
            &[cond("return.items", CompareOp::Changed, Value::Null)],
            LogicOperator::And,
            &event
        ));
        assert!(evaluate(
            &[cond("return.status", CompareOp::ChangedFrom, json!("requested"))],
            LogicOperator::And,
            &event
        ));
        assert!(!evaluate(
            &[cond("return.status", CompareOp::ChangedFrom, json!("draft"))],
            LogicOperator::And,
            &event
        ));
        assert!(evaluate(
            &[cond("return.status", CompareOp::ChangedTo, json!("approved"))],
            LogicOperator::And,
            &event
        ));
        assert!(!evaluate(
            &[cond("return.items", CompareOp::ChangedTo, json!(3))],
            LogicOperator::And,
            &event
        ));
    }

    #[test]
    fn test_changed_without_previous_is_false() {
        let event = event(json!({"return": {"status": "approved"}}));
        for operator in [CompareOp::Changed, CompareOp::ChangedFrom, CompareOp::ChangedTo] {
            let condition = cond("return.status", operator, json!("approved"));
            assert!(
                !evaluate(&[condition], LogicOperator::And, &event),
                "{:?} without previous values must be false",
                operator
            );
        }
    }
}
