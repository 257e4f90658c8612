//! Domain events emitted by Warden operations.
//!
//! Events are published on the [`EventBus`] and consumed by the audit
//! logger and any console that wants to invalidate derived state.

pub mod bus;
pub mod role;
pub mod session;
pub mod user;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use bus::EventBus;
pub use role::RoleEvent;
pub use session::SessionEvent;
pub use user::UserEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user who caused the event (if applicable).
    pub actor_id: Option<i64>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A role-related event.
    Role(RoleEvent),
    /// A user-related event.
    User(UserEvent),
    /// A session-related event.
    Session(SessionEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(actor_id: Option<i64>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }

    /// Whether the event can change some user's effective permissions.
    pub fn affects_permissions(&self) -> bool {
        matches!(
            self.payload,
            EventPayload::Role(RoleEvent::PermissionsReplaced { .. })
                | EventPayload::Role(RoleEvent::Deleted { .. })
                | EventPayload::User(UserEvent::RolesReplaced { .. })
                | EventPayload::User(UserEvent::Deleted { .. })
        )
    }
}
