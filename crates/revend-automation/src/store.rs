//! Automation storage.

use std::collections::HashMap;

use revend_core::{EventKind, TenantId};
use tokio::sync::RwLock;

use crate::definition::{Automation, AutomationId};
use crate::error::AutomationResult;

/// Read access to persisted automations.
///
/// The engine only ever reads definitions; creating and editing them is
/// the authoring surface's concern.
#[async_trait::async_trait]
pub trait AutomationStore: Send + Sync {
    /// Loads the tenant's enabled automations whose trigger matches the
    /// given event kind.
    async fn load_enabled(
        &self,
        tenant_id: TenantId,
        event: EventKind,
    ) -> AutomationResult<Vec<Automation>>;

    /// Loads one automation by ID, enabled or not.
    async fn load(
        &self,
        tenant_id: TenantId,
        id: AutomationId,
    ) -> AutomationResult<Option<Automation>>;
}

/// In-memory automation store.
///
/// Backs tests and single-process embedding; a database-backed store
/// implements [`AutomationStore`] the same way.
#[derive(Debug, Default)]
pub struct MemoryAutomationStore {
    automations: RwLock<HashMap<(TenantId, AutomationId), Automation>>,
}

impl MemoryAutomationStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an automation, touching its metadata timestamps.
    pub async fn upsert(&self, mut automation: Automation) -> AutomationId {
        automation.metadata.touch();
        let id = automation.id;
        let key = (automation.tenant_id, id);
        self.automations.write().await.insert(key, automation);
        id
    }

    /// Removes an automation, returning it if it existed.
    pub async fn remove(&self, tenant_id: TenantId, id: AutomationId) -> Option<Automation> {
        self.automations.write().await.remove(&(tenant_id, id))
    }

    /// Returns the number of stored automations across all tenants.
    pub async fn len(&self) -> usize {
        self.automations.read().await.len()
    }

    /// Returns whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.automations.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl AutomationStore for MemoryAutomationStore {
    async fn load_enabled(
        &self,
        tenant_id: TenantId,
        event: EventKind,
    ) -> AutomationResult<Vec<Automation>> {
        let automations = self.automations.read().await;
        Ok(automations
            .values()
            .filter(|automation| {
                automation.tenant_id == tenant_id
                    && automation.enabled
                    && automation.trigger_event() == Some(event)
            })
            .cloned()
            .collect())
    }

    async fn load(
        &self,
        tenant_id: TenantId,
        id: AutomationId,
    ) -> AutomationResult<Option<Automation>> {
        let automations = self.automations.read().await;
        Ok(automations.get(&(tenant_id, id)).cloned())
    }
}
