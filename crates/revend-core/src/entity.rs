//! Entity identifiers and references.

use std::str::FromStr;

use derive_more::{Debug, Display, From, Into};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};
use uuid::Uuid;

/// Kinds of entities the automation engine can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(strum::Display, AsRefStr, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    /// A customer return case.
    Return,
    /// A support ticket.
    Ticket,
    /// A customer record.
    Customer,
}

/// Unique identifier for an entity, scoped by its [`EntityKind`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display, From, Into)]
#[debug("{_0}")]
#[display("{_0}")]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates a new random entity ID.
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an entity ID from an existing UUID.
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

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

impl AsRef<Uuid> for EntityId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

/// A typed reference to one entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Debug, Display)]
#[debug("{kind}/{id}")]
#[display("{kind}/{id}")]
pub struct EntityRef {
    /// The kind of the referenced entity.
    pub kind: EntityKind,
    /// The entity's ID.
    pub id: EntityId,
}

impl EntityRef {
    /// Creates a new entity reference.
    pub const fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }

    /// Returns whether this reference points at a return.
    pub const fn is_return(&self) -> bool {
        matches!(self.kind, EntityKind::Return)
    }

    /// Returns whether this reference points at a ticket.
    pub const fn is_ticket(&self) -> bool {
        matches!(self.kind, EntityKind::Ticket)
    }

    /// Returns whether this reference points at a customer.
    pub const fn is_customer(&self) -> bool {
        matches!(self.kind, EntityKind::Customer)
    }
}

/// Fields for a ticket created by an automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    /// Ticket subject line.
    pub subject: String,
    /// Ticket body text.
    pub body: String,
    /// The entity this ticket was created for, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_to: Option<EntityRef>,
}

impl NewTicket {
    /// Creates a new ticket with the given subject and body.
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            linked_to: None,
        }
    }

    /// Links the ticket to an entity.
    pub fn linked_to(mut self, entity: EntityRef) -> Self {
        self.linked_to = Some(entity);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_str() {
        assert_eq!(EntityKind::Return.as_ref(), "return");
        assert_eq!(EntityKind::Customer.to_string(), "customer");
    }

    #[test]
    fn test_entity_ref_display() {
        let id = EntityId::from_uuid(Uuid::from_u128(42));
        let entity = EntityRef::new(EntityKind::Ticket, id);
        assert_eq!(entity.to_string(), format!("ticket/{}", id));
        assert!(entity.is_ticket());
        assert!(!entity.is_return());
    }

    #[test]
    fn test_new_ticket_link() {
        let entity = EntityRef::new(EntityKind::Return, EntityId::new());
        let ticket = NewTicket::new("Damaged item", "Inspect on arrival").linked_to(entity);
        assert_eq!(ticket.linked_to, Some(entity));
    }
}
