//! Integration tests for subscriber resolution.

mod fixtures;

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use fixtures::{add_webhook, grant, init_tracing, store, webhook, APP};
use webhook_fanout::{
    App, DeliveriesExt, DeliveryPlanner, EventPayload, EventType, InMemoryModelStore, Model,
    ModelBatch, ModelError, ModelStore, ModelsExt, Permission, ResolveError, ResolverConfig,
    SubscriberResolver, SubscriptionsExt, UnmappedPolicy, Versioned, Webhook,
};

fn ids(resolver: &SubscriberResolver<InMemoryModelStore>, event: EventType) -> HashSet<String> {
    resolver
        .resolve(event)
        .unwrap()
        .ids()
        .map(str::to_string)
        .collect()
}

fn set(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[test]
fn webhooks_for_event() {
    init_tracing();
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    let resolver = SubscriberResolver::new(store);

    assert_eq!(
        ids(&resolver, EventType::OrderCreated),
        set(&["webhook", "any-webhook"])
    );
}

#[test]
fn webhooks_for_event_when_candidates_provided() {
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    let resolver = SubscriberResolver::new(store);

    let candidates = vec![webhook("webhook")];
    let resolved = resolver
        .resolve_among(EventType::OrderCreated, &candidates)
        .unwrap();

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved.iter().next(), Some(&candidates[0]));
}

#[test]
fn app_without_permission_gets_nothing() {
    let resolver = SubscriberResolver::new(store());
    assert!(resolver.resolve(EventType::OrderCreated).unwrap().is_empty());
}

#[test]
fn direct_and_wildcard_subscription_counts_once() {
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    store.models::<Webhook>().delete("any-webhook").unwrap();
    store.subscribe("webhook", EventType::Any).unwrap();
    let resolver = SubscriberResolver::new(store);

    assert_eq!(resolver.resolve(EventType::OrderCreated).unwrap().len(), 1);
}

#[test]
fn wildcard_receives_every_permitted_event() {
    let store = store();
    for permission in Permission::ALL {
        grant(&store, APP, *permission);
    }
    let resolver = SubscriberResolver::new(store);

    for event in EventType::ALL.iter().filter(|e| !e.is_wildcard()) {
        assert!(
            ids(&resolver, *event).contains("any-webhook"),
            "wildcard webhook missing for {}",
            event
        );
    }
}

#[test]
fn permission_is_checked_per_event() {
    let store = store();
    grant(&store, APP, Permission::ManageProducts);
    let resolver = SubscriberResolver::new(store);

    assert!(ids(&resolver, EventType::OrderCreated).is_empty());
    assert_eq!(ids(&resolver, EventType::ProductCreated), set(&["any-webhook"]));
}

#[test]
fn only_the_owner_without_permission_is_excluded() {
    init_tracing();
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    store
        .models::<App>()
        .save(&App::new("other-app", "No perms"))
        .unwrap();
    add_webhook(
        &store,
        Webhook::new("c", "other-app", "https://c.test"),
        &[EventType::OrderCreated],
    );
    let resolver = SubscriberResolver::new(store);

    let resolved = ids(&resolver, EventType::OrderCreated);
    assert!(!resolved.contains("c"));
    assert_eq!(resolved, set(&["webhook", "any-webhook"]));
}

#[test]
fn inactive_webhook_is_excluded() {
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    store
        .models::<Webhook>()
        .save(&webhook("webhook").deactivated())
        .unwrap();
    let resolver = SubscriberResolver::new(store);

    assert_eq!(ids(&resolver, EventType::OrderCreated), set(&["any-webhook"]));
}

#[test]
fn inactive_app_is_excluded() {
    let store = store();
    store
        .models::<App>()
        .save(
            &App::new(APP, "Sample app")
                .with_permission(Permission::ManageOrders)
                .deactivated(),
        )
        .unwrap();
    let resolver = SubscriberResolver::new(store);

    assert!(ids(&resolver, EventType::OrderCreated).is_empty());
}

#[test]
fn webhook_without_app_is_excluded() {
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    add_webhook(
        &store,
        Webhook::new("orphan", "deleted-app", "https://orphan.test"),
        &[EventType::OrderCreated],
    );
    let resolver = SubscriberResolver::new(store);

    assert!(!ids(&resolver, EventType::OrderCreated).contains("orphan"));
}

#[test]
fn candidates_are_consumed_once() {
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    let resolver = SubscriberResolver::new(store);

    let mut pulled = 0;
    let candidates = ["webhook", "any-webhook"].into_iter().inspect(|_| pulled += 1);
    let resolved = resolver
        .resolve_among(EventType::OrderCreated, candidates)
        .unwrap();

    assert_eq!(resolved.len(), 2);
    assert_eq!(pulled, 2);
}

#[test]
fn wildcard_event_itself_is_unmapped() {
    let store = store();
    for permission in Permission::ALL {
        grant(&store, APP, *permission);
    }

    let deny = SubscriberResolver::new(store.clone());
    assert!(deny.resolve(EventType::Any).unwrap().is_empty());

    let allow = SubscriberResolver::new(store).with_unmapped_policy(UnmappedPolicy::Allow);
    assert_eq!(ids(&allow, EventType::Any), set(&["any-webhook"]));
}

#[test]
fn config_file_drives_permissions() {
    let store = store();
    grant(&store, APP, Permission::ManageApps);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[permissions]\norder_created = \"MANAGE_APPS\"").unwrap();
    let config = ResolverConfig::load(file.path()).unwrap();
    let resolver = SubscriberResolver::from_config(store, &config).unwrap();

    assert_eq!(
        ids(&resolver, EventType::OrderCreated),
        set(&["webhook", "any-webhook"])
    );
    assert!(ids(&resolver, EventType::OrderUpdated).is_empty());
}

#[test]
fn concurrent_resolution() {
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    let resolver = Arc::new(SubscriberResolver::new(store));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            thread::spawn(move || resolver.resolve(EventType::OrderCreated).unwrap().len())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}

#[test]
fn planner_fans_out_to_resolved_webhooks() {
    let store = store();
    grant(&store, APP, Permission::ManageOrders);
    let resolver = SubscriberResolver::new(store);

    let plan = DeliveryPlanner::new(&resolver)
        .plan(EventType::OrderCreated, &serde_json::json!({"order": "T3JkZXI6MQ=="}))
        .unwrap();

    let targets: HashSet<String> = plan.deliveries.iter().map(|d| d.webhook_id.clone()).collect();
    assert_eq!(targets, set(&["webhook", "any-webhook"]));
    assert_eq!(resolver.store().pending_deliveries().unwrap().len(), 2);
}

struct UnavailableStore;

impl ModelStore for UnavailableStore {
    fn get_model<M: Model>(&self, _id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        Err(ModelError::Storage("connection refused".into()))
    }

    fn save_model<M: Model>(&self, _model: &M) -> Result<Versioned<M>, ModelError> {
        Err(ModelError::Storage("connection refused".into()))
    }

    fn commit_batch(&self, _batch: ModelBatch) -> Result<(), ModelError> {
        Err(ModelError::Storage("connection refused".into()))
    }

    fn delete_model<M: Model>(&self, _id: &str) -> Result<bool, ModelError> {
        Err(ModelError::Storage("connection refused".into()))
    }

    fn find_models<M: Model>(
        &self,
        _predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError> {
        Err(ModelError::Storage("connection refused".into()))
    }
}

#[test]
fn store_failures_propagate_unchanged() {
    init_tracing();
    let resolver = SubscriberResolver::new(UnavailableStore);

    let err = resolver.resolve(EventType::OrderCreated).unwrap_err();
    assert_eq!(
        err,
        ResolveError::Store(ModelError::Storage("connection refused".into()))
    );
    assert_eq!(
        err.to_string(),
        "subscriber lookup failed: model storage error: connection refused"
    );
}

/// Reads from the wrapped store; every batch write runs out of space.
struct FullDiskStore(InMemoryModelStore);

impl ModelStore for FullDiskStore {
    fn get_model<M: Model>(&self, id: &str) -> Result<Option<Versioned<M>>, ModelError> {
        self.0.get_model(id)
    }

    fn save_model<M: Model>(&self, model: &M) -> Result<Versioned<M>, ModelError> {
        self.0.save_model(model)
    }

    fn commit_batch(&self, _batch: ModelBatch) -> Result<(), ModelError> {
        Err(ModelError::Storage("disk full".into()))
    }

    fn delete_model<M: Model>(&self, id: &str) -> Result<bool, ModelError> {
        self.0.delete_model::<M>(id)
    }

    fn find_models<M: Model>(
        &self,
        predicate: &dyn Fn(&M) -> bool,
    ) -> Result<Vec<Versioned<M>>, ModelError> {
        self.0.find_models(predicate)
    }
}

#[test]
fn failed_plan_write_leaves_no_records() {
    init_tracing();
    let inner = store();
    grant(&inner, APP, Permission::ManageOrders);
    add_webhook(&inner, webhook("third-webhook"), &[EventType::OrderCreated]);
    let resolver = SubscriberResolver::new(FullDiskStore(inner.clone()));
    assert_eq!(resolver.resolve(EventType::OrderCreated).unwrap().len(), 3);

    let err = DeliveryPlanner::new(&resolver)
        .plan(EventType::OrderCreated, &serde_json::json!({}))
        .unwrap_err();

    assert_eq!(err, ResolveError::Plan(ModelError::Storage("disk full".into())));
    assert_eq!(
        err.to_string(),
        "storing delivery plan failed: model storage error: disk full"
    );
    assert!(inner.models::<EventPayload>().all().unwrap().is_empty());
    assert!(inner.pending_deliveries().unwrap().is_empty());
}

#[test]
fn unmapped_event_short_circuits_before_the_store() {
    let resolver = SubscriberResolver::new(UnavailableStore);
    assert!(resolver.resolve(EventType::Any).unwrap().is_empty());
    assert!(resolver.resolve_named("not_an_event").unwrap().is_empty());
}
