//! Action node definitions.
//!
//! Actions form a closed tagged union: adding a new action kind means
//! adding a variant here and one dispatch arm in the engine, nothing else.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{AsRefStr, IntoStaticStr};

/// Action node payload: which side effect to perform and its parameters.
///
/// String parameters marked as templated support `{{path}}` placeholders
/// resolved against the event snapshot at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[derive(AsRefStr, IntoStaticStr)]
#[serde(tag = "action", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionDef {
    /// Sets a named field on the triggering entity.
    UpdateField(UpdateFieldAction),
    /// Transitions the triggering entity through its status machine.
    TransitionStatus(TransitionStatusAction),
    /// Renders and sends a notification.
    SendNotification(SendNotificationAction),
    /// Adds a tag to the triggering entity.
    AddTag(TagAction),
    /// Removes a tag from the triggering entity.
    RemoveTag(TagAction),
    /// Creates a ticket linked to the triggering entity.
    CreateTicket(CreateTicketAction),
}

impl ActionDef {
    /// Returns the action kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.into()
    }
}

/// Parameters for the `update_field` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFieldAction {
    /// Name of the field to set.
    pub field: String,
    /// The value to write. String values are templated.
    pub value: Value,
}

impl UpdateFieldAction {
    /// Creates a new field update action.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Parameters for the `transition_status` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionStatusAction {
    /// The status to transition to.
    pub status: String,
    /// Optional comment recorded with the transition. Templated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TransitionStatusAction {
    /// Creates a new status transition action.
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            comment: None,
        }
    }

    /// Attaches a comment to the transition.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Parameters for the `send_notification` action.
///
/// The event snapshot is passed to the notifier as template variables;
/// the notifier owns rendering of the named template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendNotificationAction {
    /// Name of the notification template.
    pub template: String,
}

impl SendNotificationAction {
    /// Creates a new notification action for the given template.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

/// Parameters for the `add_tag` and `remove_tag` actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAction {
    /// The tag to add or remove.
    pub tag: String,
}

impl TagAction {
    /// Creates a new tag action.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// Parameters for the `create_ticket` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTicketAction {
    /// Ticket subject line. Templated.
    pub subject: String,
    /// Ticket body text. Templated.
    pub body: String,
}

impl CreateTicketAction {
    /// Creates a new ticket creation action.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}
