//! Action execution against back-office collaborators.

use std::fmt;
use std::sync::Arc;

use revend_core::effect::{EntityStore, NotificationRequest, Notifier};
use revend_core::{ActorId, DomainEvent, NewTicket};
use serde_json::Value;

use crate::TRACING_TARGET;
use crate::definition::{ActionDef, NodeId};
use crate::engine::template;
use crate::error::{AutomationError, AutomationResult};

/// Outcome of a single action execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran and its side effect was applied.
    Executed,
    /// The action was skipped by tenant configuration.
    Skipped,
}

/// Executes action nodes against the entity store and notifier.
///
/// Each execution is independent: a failure is reported to the caller as
/// [`AutomationError::ActionFailed`] and leaves the collaborators in
/// whatever state the failed call produced. The dispatcher never retries.
#[derive(Clone)]
pub struct ActionDispatcher {
    entities: Arc<dyn EntityStore>,
    notifier: Arc<dyn Notifier>,
    actor: Option<ActorId>,
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("actor", &self.actor)
            .finish_non_exhaustive()
    }
}

impl ActionDispatcher {
    /// Creates a new dispatcher over the given collaborators.
    pub fn new(entities: Arc<dyn EntityStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            entities,
            notifier,
            actor: None,
        }
    }

    /// Sets the actor id recorded on entity writes made by automations.
    #[must_use]
    pub fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Executes one action node against the collaborators.
    ///
    /// Templated string parameters are rendered against the event snapshot
    /// before the call goes out. Collaborator failures come back as
    /// [`AutomationError::ActionFailed`] carrying the failing node's id;
    /// the caller decides whether the surrounding walk continues.
    pub async fn execute(
        &self,
        node_id: NodeId,
        action: &ActionDef,
        event: &DomainEvent,
    ) -> AutomationResult<ActionOutcome> {
        match action {
            ActionDef::UpdateField(update) => {
                let value = resolve_value(&update.value, event);
                self.entities
                    .update_field(event.tenant_id, event.entity, &update.field, value)
                    .await
                    .map_err(|source| AutomationError::ActionFailed { node_id, source })?;
            }
            ActionDef::TransitionStatus(transition) => {
                let comment = transition
                    .comment
                    .as_deref()
                    .map(|comment| template::render(comment, &event.snapshot));
                self.entities
                    .transition_status(
                        event.tenant_id,
                        event.entity,
                        &transition.status,
                        comment,
                        self.actor,
                    )
                    .await
                    .map_err(|source| AutomationError::ActionFailed { node_id, source })?;
            }
            ActionDef::SendNotification(notification) => {
                let settings = self
                    .notifier
                    .settings(event.tenant_id)
                    .await
                    .map_err(|source| AutomationError::ActionFailed { node_id, source })?;
                if !settings.enabled {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        tenant_id = %event.tenant_id,
                        node_id = %node_id,
                        "Notifications disabled for tenant, skipping action"
                    );
                    return Ok(ActionOutcome::Skipped);
                }

                let request = NotificationRequest::new(&notification.template, event.entity)
                    .with_context(event.snapshot.current.clone());
                self.notifier
                    .send(event.tenant_id, request)
                    .await
                    .map_err(|source| AutomationError::ActionFailed { node_id, source })?;
            }
            ActionDef::AddTag(tag) => {
                self.entities
                    .add_tag(event.tenant_id, event.entity, &tag.tag)
                    .await
                    .map_err(|source| AutomationError::ActionFailed { node_id, source })?;
            }
            ActionDef::RemoveTag(tag) => {
                self.entities
                    .remove_tag(event.tenant_id, event.entity, &tag.tag)
                    .await
                    .map_err(|source| AutomationError::ActionFailed { node_id, source })?;
            }
            ActionDef::CreateTicket(create) => {
                let ticket = NewTicket::new(
                    template::render(&create.subject, &event.snapshot),
                    template::render(&create.body, &event.snapshot),
                )
                .linked_to(event.entity);
                let ticket_id = self
                    .entities
                    .create_ticket(event.tenant_id, ticket)
                    .await
                    .map_err(|source| AutomationError::ActionFailed { node_id, source })?;
                tracing::debug!(
                    target: TRACING_TARGET,
                    ticket_id = %ticket_id,
                    entity = %event.entity,
                    "Automation created ticket"
                );
            }
        }

        tracing::debug!(
            target: TRACING_TARGET,
            node_id = %node_id,
            action = action.kind_str(),
            entity = %event.entity,
            "Executed automation action"
        );
        Ok(ActionOutcome::Executed)
    }
}

/// Resolves an action parameter, templating string values.
fn resolve_value(value: &Value, event: &DomainEvent) -> Value {
    match value {
        Value::String(text) => Value::String(template::render(text, &event.snapshot)),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use revend_core::mock::{EntityCall, MockEntityStore, MockNotifier};
    use revend_core::{EntityId, EntityKind, EntityRef, EventKind, EventSnapshot, TenantId};
    use serde_json::json;

    use super::*;
    use crate::definition::{
        CreateTicketAction, SendNotificationAction, TagAction, TransitionStatusAction,
        UpdateFieldAction,
    };

    fn return_event() -> DomainEvent {
        DomainEvent::new(
            TenantId::new(),
            EventKind::ReturnCreated,
            EntityRef::new(EntityKind::Return, EntityId::new()),
            EventSnapshot::new(json!({
                "return": {"id": "R-1042", "status": "requested", "items": 3}
            })),
        )
    }

    #[tokio::test]
    async fn test_update_field_templates_string_values() {
        let store = Arc::new(MockEntityStore::new());
        let dispatcher = ActionDispatcher::new(store.clone(), Arc::new(MockNotifier::new()));
        let event = return_event();
        let action = ActionDef::UpdateField(UpdateFieldAction::new(
            "resolution_note",
            json!("auto-processed {{return.id}}"),
        ));

        let outcome = dispatcher
            .execute(NodeId::new(), &action, &event)
            .await
            .expect("action failed");

        assert_eq!(outcome, ActionOutcome::Executed);
        match &store.calls()[0] {
            EntityCall::UpdateField { field, value, .. } => {
                assert_eq!(field, "resolution_note");
                assert_eq!(value, &json!("auto-processed R-1042"));
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_field_keeps_non_string_values() {
        let store = Arc::new(MockEntityStore::new());
        let dispatcher = ActionDispatcher::new(store.clone(), Arc::new(MockNotifier::new()));
        let action = ActionDef::UpdateField(UpdateFieldAction::new("priority", json!(2)));

        dispatcher
            .execute(NodeId::new(), &action, &return_event())
            .await
            .expect("action failed");

        match &store.calls()[0] {
            EntityCall::UpdateField { value, .. } => assert_eq!(value, &json!(2)),
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transition_records_actor_and_comment() {
        let store = Arc::new(MockEntityStore::new());
        let actor = ActorId::new();
        let dispatcher = ActionDispatcher::new(store.clone(), Arc::new(MockNotifier::new()))
            .with_actor(actor);
        let action = ActionDef::TransitionStatus(
            TransitionStatusAction::new("approved")
                .with_comment("auto-approved ({{return.items}} items)"),
        );

        dispatcher
            .execute(NodeId::new(), &action, &return_event())
            .await
            .expect("action failed");

        match &store.calls()[0] {
            EntityCall::TransitionStatus {
                status,
                comment,
                actor_id,
                ..
            } => {
                assert_eq!(status, "approved");
                assert_eq!(comment.as_deref(), Some("auto-approved (3 items)"));
                assert_eq!(*actor_id, Some(actor));
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_notification_carries_snapshot_context() {
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = ActionDispatcher::new(Arc::new(MockEntityStore::new()), notifier.clone());
        let event = return_event();
        let action = ActionDef::SendNotification(SendNotificationAction::new("return_received"));

        let outcome = dispatcher
            .execute(NodeId::new(), &action, &event)
            .await
            .expect("action failed");

        assert_eq!(outcome, ActionOutcome::Executed);
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, event.tenant_id);
        assert_eq!(sent[0].1.template, "return_received");
        assert_eq!(sent[0].1.context, event.snapshot.current);
    }

    #[tokio::test]
    async fn test_notification_skipped_when_tenant_disabled() {
        let notifier = Arc::new(MockNotifier::disabled());
        let dispatcher = ActionDispatcher::new(Arc::new(MockEntityStore::new()), notifier.clone());
        let action = ActionDef::SendNotification(SendNotificationAction::new("return_received"));

        let outcome = dispatcher
            .execute(NodeId::new(), &action, &return_event())
            .await
            .expect("action failed");

        assert_eq!(outcome, ActionOutcome::Skipped);
        assert_eq!(notifier.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_send_reports_the_failing_node() {
        let dispatcher = ActionDispatcher::new(
            Arc::new(MockEntityStore::new()),
            Arc::new(MockNotifier::failing()),
        );
        let node_id = NodeId::new();
        let action = ActionDef::SendNotification(SendNotificationAction::new("return_received"));

        let err = dispatcher
            .execute(node_id, &action, &return_event())
            .await
            .expect_err("send should fail");

        match err {
            AutomationError::ActionFailed { node_id: failed, .. } => assert_eq!(failed, node_id),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_ticket_links_the_triggering_entity() {
        let store = Arc::new(MockEntityStore::new());
        let dispatcher = ActionDispatcher::new(store.clone(), Arc::new(MockNotifier::new()));
        let event = return_event();
        let action = ActionDef::CreateTicket(CreateTicketAction::new(
            "Inspect {{return.id}}",
            "Flagged by automation",
        ));

        dispatcher
            .execute(NodeId::new(), &action, &event)
            .await
            .expect("action failed");

        match &store.calls()[0] {
            EntityCall::CreateTicket { ticket, .. } => {
                assert_eq!(ticket.subject, "Inspect R-1042");
                assert_eq!(ticket.linked_to, Some(event.entity));
            }
            other => panic!("unexpected call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tag_actions_pass_literal_tags() {
        let store = Arc::new(MockEntityStore::new());
        let dispatcher = ActionDispatcher::new(store.clone(), Arc::new(MockNotifier::new()));
        let event = return_event();

        dispatcher
            .execute(
                NodeId::new(),
                &ActionDef::AddTag(TagAction::new("high-risk")),
                &event,
            )
            .await
            .expect("add failed");
        dispatcher
            .execute(
                NodeId::new(),
                &ActionDef::RemoveTag(TagAction::new("new")),
                &event,
            )
            .await
            .expect("remove failed");

        assert_eq!(store.tags_added(), vec!["high-risk".to_owned()]);
        assert_eq!(store.call_count(), 2);
    }
}
