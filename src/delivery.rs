//! Delivery hand-off: one stored payload per event, one pending delivery per
//! resolved webhook. Sending is the dispatcher's job.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ResolveError;
use crate::event_type::EventType;
use crate::resolver::{ResolvedSubscribers, SubscriberResolver};
use crate::store::{Model, ModelBatch, ModelError, ModelStore, ModelsExt};
use crate::subscriber::SubscriberRef;

static NEXT_PAYLOAD: AtomicU64 = AtomicU64::new(1);

fn next_payload_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("payload-{}-{}", nanos, NEXT_PAYLOAD.fetch_add(1, Ordering::Relaxed))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

/// Serialized event body shared by all deliveries of one event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub id: String,
    pub event_type: EventType,
    pub payload: String,
    pub created_at: SystemTime,
}

impl Model for EventPayload {
    const COLLECTION: &'static str = "event_payloads";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A payload addressed to one webhook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDelivery {
    pub id: String,
    pub payload_id: String,
    pub webhook_id: String,
    pub event_type: EventType,
    pub status: DeliveryStatus,
}

impl Model for EventDelivery {
    const COLLECTION: &'static str = "event_deliveries";

    fn id(&self) -> &str {
        &self.id
    }
}

/// What `DeliveryPlanner::plan` stored. `payload` is `None` when nobody
/// was subscribed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeliveryPlan {
    pub payload: Option<EventPayload>,
    pub deliveries: Vec<EventDelivery>,
}

impl DeliveryPlan {
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }
}

/// Turns an event into stored deliveries for every webhook that should get it.
///
/// The payload and its deliveries are written in one `commit_batch` call, so
/// a failed plan leaves nothing behind.
pub struct DeliveryPlanner<'a, S> {
    resolver: &'a SubscriberResolver<S>,
}

impl<'a, S: ModelStore> DeliveryPlanner<'a, S> {
    pub fn new(resolver: &'a SubscriberResolver<S>) -> Self {
        Self { resolver }
    }

    pub fn plan(
        &self,
        event: EventType,
        payload: &serde_json::Value,
    ) -> Result<DeliveryPlan, ResolveError> {
        let subscribers = self.resolver.resolve(event)?;
        self.store_plan(event, payload, subscribers)
    }

    /// Like `plan`, limited to `candidates`.
    pub fn plan_among<I>(
        &self,
        event: EventType,
        payload: &serde_json::Value,
        candidates: I,
    ) -> Result<DeliveryPlan, ResolveError>
    where
        I: IntoIterator,
        I::Item: SubscriberRef,
    {
        let subscribers = self.resolver.resolve_among(event, candidates)?;
        self.store_plan(event, payload, subscribers)
    }

    fn store_plan(
        &self,
        event: EventType,
        payload: &serde_json::Value,
        subscribers: ResolvedSubscribers,
    ) -> Result<DeliveryPlan, ResolveError> {
        if subscribers.is_empty() {
            debug!(%event, "no subscribers; payload not stored");
            return Ok(DeliveryPlan::default());
        }

        let body = serde_json::to_string(payload)
            .map_err(|e| ResolveError::Plan(ModelError::Serde(e.to_string())))?;
        let payload = EventPayload {
            id: next_payload_id(),
            event_type: event,
            payload: body,
            created_at: SystemTime::now(),
        };

        let mut batch = ModelBatch::new();
        batch.insert(&payload).map_err(ResolveError::Plan)?;
        let mut deliveries = Vec::with_capacity(subscribers.len());
        for webhook in &subscribers {
            let delivery = EventDelivery {
                id: format!("{}:{}", payload.id, webhook.id),
                payload_id: payload.id.clone(),
                webhook_id: webhook.id.clone(),
                event_type: event,
                status: DeliveryStatus::Pending,
            };
            batch.insert(&delivery).map_err(ResolveError::Plan)?;
            deliveries.push(delivery);
        }
        self.resolver
            .store()
            .commit_batch(batch)
            .map_err(ResolveError::Plan)?;

        info!(
            %event,
            payload = %payload.id,
            deliveries = deliveries.len(),
            "planned webhook deliveries"
        );
        Ok(DeliveryPlan {
            payload: Some(payload),
            deliveries,
        })
    }
}

/// Delivery queries on any ModelStore.
pub trait DeliveriesExt: ModelStore + Sized {
    fn pending_deliveries(&self) -> Result<Vec<EventDelivery>, ModelError> {
        self.models::<EventDelivery>()
            .find(&|d: &EventDelivery| d.status == DeliveryStatus::Pending)
    }

    fn payload_for(&self, delivery: &EventDelivery) -> Result<EventPayload, ModelError> {
        Ok(self
            .models::<EventPayload>()
            .require(&delivery.payload_id)?
            .data)
    }
}

impl<S: ModelStore> DeliveriesExt for S {}
