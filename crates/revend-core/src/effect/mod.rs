//! Collaborator traits for externally-visible side effects.
//!
//! The automation engine never touches storage or delivery infrastructure
//! directly. Every effect goes through one of the traits in this module,
//! implemented elsewhere in the application; the collaborator owns its own
//! consistency (optimistic concurrency, timeline entries, delivery retries).

use std::sync::Arc;

mod entity_store;
mod notifier;

pub use entity_store::EntityStore;
pub use notifier::{NotificationRequest, NotificationSettings, Notifier};

/// Type alias for a shared entity store.
pub type SharedEntityStore = Arc<dyn EntityStore>;

/// Type alias for a shared notifier.
pub type SharedNotifier = Arc<dyn Notifier>;
