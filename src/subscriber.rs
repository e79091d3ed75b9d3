//! Webhook records: apps own webhooks, webhooks subscribe to event types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::event_type::EventType;
use crate::permission::Permission;
use crate::store::{Model, ModelError, ModelStore, ModelsExt, Versioned};

/// The account that owns webhooks. Its permissions gate which events those
/// webhooks may receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    pub id: String,
    pub name: String,
    #[serde(default = "active")]
    pub is_active: bool,
    #[serde(default)]
    pub permissions: BTreeSet<Permission>,
}

fn active() -> bool {
    true
}

impl App {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active: true,
            permissions: BTreeSet::new(),
        }
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn has_perm(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns false if the permission was already granted.
    pub fn grant(&mut self, permission: Permission) -> bool {
        self.permissions.insert(permission)
    }

    pub fn revoke(&mut self, permission: Permission) -> bool {
        self.permissions.remove(&permission)
    }
}

impl Model for App {
    const COLLECTION: &'static str = "apps";

    fn id(&self) -> &str {
        &self.id
    }
}

/// An external endpoint registered to receive events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Webhook {
    pub id: String,
    pub app_id: String,
    pub name: String,
    pub target_url: String,
    #[serde(default = "active")]
    pub is_active: bool,
}

impl Webhook {
    pub fn new(
        id: impl Into<String>,
        app_id: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            app_id: app_id.into(),
            target_url: target_url.into(),
            is_active: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }
}

impl Model for Webhook {
    const COLLECTION: &'static str = "webhooks";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Membership of a webhook in one event type, or in all of them via `Any`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub webhook_id: String,
    pub event_type: EventType,
}

impl WebhookEvent {
    /// Row id is `"<webhook_id>:<event_type>"`; use [`WebhookEvent::with_id`]
    /// to store more than one row for the same pair.
    pub fn new(webhook_id: impl Into<String>, event_type: EventType) -> Self {
        let webhook_id = webhook_id.into();
        Self {
            id: format!("{}:{}", webhook_id, event_type),
            webhook_id,
            event_type,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

impl Model for WebhookEvent {
    const COLLECTION: &'static str = "webhook_events";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Anything that identifies a webhook: the record itself or its id.
///
/// Candidate sets passed to the resolver are matched on this identity only.
pub trait SubscriberRef {
    fn subscriber_id(&self) -> &str;
}

impl SubscriberRef for Webhook {
    fn subscriber_id(&self) -> &str {
        &self.id
    }
}

impl SubscriberRef for Versioned<Webhook> {
    fn subscriber_id(&self) -> &str {
        &self.data.id
    }
}

impl SubscriberRef for str {
    fn subscriber_id(&self) -> &str {
        self
    }
}

impl SubscriberRef for String {
    fn subscriber_id(&self) -> &str {
        self.as_str()
    }
}

impl<T: SubscriberRef + ?Sized> SubscriberRef for &T {
    fn subscriber_id(&self) -> &str {
        (**self).subscriber_id()
    }
}

/// Subscription management on any ModelStore.
pub trait SubscriptionsExt: ModelStore + Sized {
    /// Store a subscription of `webhook_id` to `event_type`.
    fn subscribe(
        &self,
        webhook_id: &str,
        event_type: EventType,
    ) -> Result<WebhookEvent, ModelError> {
        let row = WebhookEvent::new(webhook_id, event_type);
        Ok(self.models::<WebhookEvent>().save(&row)?.data)
    }

    /// Remove every row subscribing `webhook_id` to `event_type`.
    /// Returns how many rows were removed.
    fn unsubscribe(&self, webhook_id: &str, event_type: EventType) -> Result<usize, ModelError> {
        let events = self.models::<WebhookEvent>();
        let rows = events
            .find(&|row: &WebhookEvent| row.webhook_id == webhook_id && row.event_type == event_type)?;
        let mut removed = 0;
        for row in rows {
            if events.delete(&row.id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Event types `webhook_id` is subscribed to, without duplicates.
    fn subscriptions_of(&self, webhook_id: &str) -> Result<BTreeSet<EventType>, ModelError> {
        Ok(self
            .models::<WebhookEvent>()
            .find(&|row: &WebhookEvent| row.webhook_id == webhook_id)?
            .into_iter()
            .map(|row| row.event_type)
            .collect())
    }
}

impl<S: ModelStore> SubscriptionsExt for S {}
