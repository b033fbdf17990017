//! Mock collaborator implementations for testing.
//!
//! This module provides in-memory implementations of [`EntityStore`] and
//! [`Notifier`] that record every call and can be configured to fail, so
//! engine behavior around partial failures can be tested without any real
//! storage or delivery backend.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! revend-core = { version = "...", features = ["test-utils"] }
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::effect::{EntityStore, NotificationRequest, NotificationSettings, Notifier};
use crate::entity::{EntityId, EntityRef, NewTicket};
use crate::error::{Error, Result};
use crate::tenant::{ActorId, TenantId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One recorded [`EntityStore`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityCall {
    /// A field write.
    UpdateField {
        tenant_id: TenantId,
        entity: EntityRef,
        field: String,
        value: Value,
    },
    /// A status transition.
    TransitionStatus {
        tenant_id: TenantId,
        entity: EntityRef,
        status: String,
        comment: Option<String>,
        actor_id: Option<ActorId>,
    },
    /// A tag addition.
    AddTag {
        tenant_id: TenantId,
        entity: EntityRef,
        tag: String,
    },
    /// A tag removal.
    RemoveTag {
        tenant_id: TenantId,
        entity: EntityRef,
        tag: String,
    },
    /// A ticket creation.
    CreateTicket {
        tenant_id: TenantId,
        ticket: NewTicket,
    },
}

/// Mock entity store that records calls.
///
/// Calls are recorded before the configured failure is applied, so tests
/// can assert that an attempt was made even when it failed.
#[derive(Debug, Default)]
pub struct MockEntityStore {
    fail_writes: bool,
    calls: Mutex<Vec<EntityCall>>,
}

impl MockEntityStore {
    /// Creates a mock store where every operation succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock store where every operation fails with a rejection.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<EntityCall> {
        lock(&self.calls).clone()
    }

    /// Returns the number of recorded calls.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns the tags added so far, in call order.
    pub fn tags_added(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                EntityCall::AddTag { tag, .. } => Some(tag.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: EntityCall) -> Result<()> {
        lock(&self.calls).push(call);
        if self.fail_writes {
            return Err(Error::rejected().with_message("mock write rejected"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl EntityStore for MockEntityStore {
    async fn update_field(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        field: &str,
        value: Value,
    ) -> Result<()> {
        self.record(EntityCall::UpdateField {
            tenant_id,
            entity,
            field: field.to_owned(),
            value,
        })
    }

    async fn transition_status(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        new_status: &str,
        comment: Option<String>,
        actor_id: Option<ActorId>,
    ) -> Result<()> {
        self.record(EntityCall::TransitionStatus {
            tenant_id,
            entity,
            status: new_status.to_owned(),
            comment,
            actor_id,
        })
    }

    async fn add_tag(&self, tenant_id: TenantId, entity: EntityRef, tag: &str) -> Result<()> {
        self.record(EntityCall::AddTag {
            tenant_id,
            entity,
            tag: tag.to_owned(),
        })
    }

    async fn remove_tag(&self, tenant_id: TenantId, entity: EntityRef, tag: &str) -> Result<()> {
        self.record(EntityCall::RemoveTag {
            tenant_id,
            entity,
            tag: tag.to_owned(),
        })
    }

    async fn create_ticket(&self, tenant_id: TenantId, ticket: NewTicket) -> Result<EntityId> {
        self.record(EntityCall::CreateTicket { tenant_id, ticket })?;
        Ok(EntityId::new())
    }
}

/// Mock notifier that records sent notifications.
#[derive(Debug)]
pub struct MockNotifier {
    settings: NotificationSettings,
    fail_send: bool,
    sent: Mutex<Vec<(TenantId, NotificationRequest)>>,
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MockNotifier {
    /// Creates a mock notifier with notifications enabled.
    pub fn new() -> Self {
        Self {
            settings: NotificationSettings::default(),
            fail_send: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock notifier whose tenant settings disable notifications.
    pub fn disabled() -> Self {
        Self {
            settings: NotificationSettings {
                enabled: false,
                reply_to: None,
            },
            ..Self::new()
        }
    }

    /// Creates a mock notifier where sending fails.
    pub fn failing() -> Self {
        Self {
            fail_send: true,
            ..Self::new()
        }
    }

    /// Returns all sent notifications with the tenant they were sent for.
    pub fn sent(&self) -> Vec<(TenantId, NotificationRequest)> {
        lock(&self.sent).clone()
    }

    /// Returns the number of sent notifications.
    pub fn sent_count(&self) -> usize {
        lock(&self.sent).len()
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn settings(&self, _tenant_id: TenantId) -> Result<NotificationSettings> {
        Ok(self.settings.clone())
    }

    async fn send(&self, tenant_id: TenantId, notification: NotificationRequest) -> Result<()> {
        if self.fail_send {
            return Err(Error::unavailable().with_message("mock delivery unavailable"));
        }
        lock(&self.sent).push((tenant_id, notification));
        Ok(())
    }
}
