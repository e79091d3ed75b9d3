mod config;
mod delivery;
mod error;
mod event_type;
mod permission;
mod resolver;
mod store;
mod subscriber;

pub mod serializers;

pub use config::{ConfigError, PermissionOverride, ResolverConfig, UnmappedPolicy};
pub use delivery::{
    DeliveriesExt, DeliveryPlan, DeliveryPlanner, DeliveryStatus, EventDelivery, EventPayload,
};
pub use error::ResolveError;
pub use event_type::{EventType, UnknownEventType};
pub use permission::{Permission, PermissionMap, UnknownPermission};
pub use resolver::{ResolvedSubscribers, SubscriberResolver};
pub use store::{
    InMemoryModelStore, Model, ModelBatch, ModelError, ModelRepository, ModelStore, ModelsExt,
    QueuedInsert, Versioned,
};
pub use subscriber::{App, SubscriberRef, SubscriptionsExt, Webhook, WebhookEvent};
