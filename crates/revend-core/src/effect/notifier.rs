//! Notification delivery operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::EntityRef;
use crate::error::Result;
use crate::tenant::TenantId;

/// Per-tenant notification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Whether notifications are enabled for the tenant.
    pub enabled: bool,
    /// Optional reply-to address configured by the tenant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            reply_to: None,
        }
    }
}

/// A request to render and deliver one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Name of the notification template to render.
    pub template: String,
    /// The entity the notification is about.
    pub entity: EntityRef,
    /// Template variables, typically the event snapshot.
    #[serde(default)]
    pub context: Value,
}

impl NotificationRequest {
    /// Creates a new notification request for the given template.
    pub fn new(template: impl Into<String>, entity: EntityRef) -> Self {
        Self {
            template: template.into(),
            entity,
            context: Value::Null,
        }
    }

    /// Attaches template variables.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// Notification rendering and delivery.
///
/// `send` renders the named template with the request's context and
/// enqueues delivery; it returns once the notification is accepted, not
/// once it is delivered.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Loads the tenant's notification settings.
    async fn settings(&self, tenant_id: TenantId) -> Result<NotificationSettings>;

    /// Renders and enqueues one notification.
    async fn send(&self, tenant_id: TenantId, notification: NotificationRequest) -> Result<()>;
}
