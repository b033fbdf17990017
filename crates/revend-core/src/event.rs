//! Domain events emitted by entity-mutation code paths.
//!
//! Events are constructed *after* the underlying entity write has succeeded
//! and handed to the automation engine; a rule failure can therefore never
//! undo or block the mutation that caused it.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, IntoStaticStr};

use crate::entity::{EntityKind, EntityRef};
use crate::snapshot::EventSnapshot;
use crate::tenant::TenantId;

/// Kinds of domain events that can trigger automation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(strum::Display, AsRefStr, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// A return case was created.
    ReturnCreated,
    /// A return case changed status.
    ReturnStatusChanged,
    /// A support ticket was created.
    TicketCreated,
    /// A support ticket changed status.
    TicketStatusChanged,
    /// A customer's risk score changed.
    CustomerRiskChanged,
    /// A customer record was updated.
    CustomerUpdated,
}

impl EventKind {
    /// Returns the kind of entity this event concerns.
    pub const fn entity_kind(&self) -> EntityKind {
        match self {
            EventKind::ReturnCreated | EventKind::ReturnStatusChanged => EntityKind::Return,
            EventKind::TicketCreated | EventKind::TicketStatusChanged => EntityKind::Ticket,
            EventKind::CustomerRiskChanged | EventKind::CustomerUpdated => EntityKind::Customer,
        }
    }
}

/// A domain event, constructed at trigger time.
///
/// An event lives for the duration of one dispatch, plus any delayed
/// continuation it gets captured into. It is never persisted and its
/// snapshot is never re-read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    /// The tenant the event belongs to.
    pub tenant_id: TenantId,
    /// The kind of event.
    pub kind: EventKind,
    /// The entity whose mutation produced the event.
    pub entity: EntityRef,
    /// Field values captured at the moment the event fired.
    pub snapshot: EventSnapshot,
}

impl DomainEvent {
    /// Creates a new domain event.
    pub fn new(
        tenant_id: TenantId,
        kind: EventKind,
        entity: EntityRef,
        snapshot: EventSnapshot,
    ) -> Self {
        Self {
            tenant_id,
            kind,
            entity,
            snapshot,
        }
    }
}
