use webhook_fanout::{
    App, EventType, InMemoryModelStore, ModelsExt, Permission, SubscriptionsExt, Webhook,
};

pub const APP: &str = "app";

/// An active app with no permissions, one webhook subscribed to
/// `order_created` and one subscribed to everything.
pub fn store() -> InMemoryModelStore {
    let store = InMemoryModelStore::new();
    store
        .models::<App>()
        .save(&App::new(APP, "Sample app"))
        .unwrap();
    add_webhook(&store, webhook("webhook"), &[EventType::OrderCreated]);
    add_webhook(&store, webhook("any-webhook"), &[EventType::Any]);
    store
}

pub fn webhook(id: &str) -> Webhook {
    Webhook::new(id, APP, format!("http://www.example.com/{}", id))
}

pub fn add_webhook(store: &InMemoryModelStore, webhook: Webhook, events: &[EventType]) {
    store.models::<Webhook>().save(&webhook).unwrap();
    for event in events {
        store.subscribe(&webhook.id, *event).unwrap();
    }
}

pub fn grant(store: &InMemoryModelStore, app_id: &str, permission: Permission) {
    let apps = store.models::<App>();
    let mut app = apps.require(app_id).unwrap().data;
    app.grant(permission);
    apps.save(&app).unwrap();
}

/// Route resolver logs to the test harness; `RUST_LOG=webhook_fanout=trace`
/// shows why each webhook was dropped.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
