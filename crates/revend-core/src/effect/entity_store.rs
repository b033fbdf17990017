//! Entity mutation operations.

use serde_json::Value;

use crate::entity::{EntityId, EntityRef, NewTicket};
use crate::error::Result;
use crate::tenant::{ActorId, TenantId};

/// Mutation operations on returns, tickets and customers.
///
/// All writes are scoped by an explicit tenant id. Implementations own
/// their consistency model; callers must tolerate an entity having changed
/// between the time a value was read and a write lands.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// Sets a named field on an entity to the given value.
    async fn update_field(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        field: &str,
        value: Value,
    ) -> Result<()>;

    /// Transitions an entity through its status machine.
    ///
    /// Unlike [`EntityStore::update_field`] on a status field, this invokes
    /// the entity's own transition operation so its downstream effects
    /// (timeline entries, follow-up notifications) still fire.
    async fn transition_status(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        new_status: &str,
        comment: Option<String>,
        actor_id: Option<ActorId>,
    ) -> Result<()>;

    /// Adds a tag to an entity's tag set.
    async fn add_tag(&self, tenant_id: TenantId, entity: EntityRef, tag: &str) -> Result<()>;

    /// Removes a tag from an entity's tag set.
    async fn remove_tag(&self, tenant_id: TenantId, entity: EntityRef, tag: &str) -> Result<()>;

    /// Creates a new ticket and returns its id.
    async fn create_ticket(&self, tenant_id: TenantId, ticket: NewTicket) -> Result<EntityId>;
}
