//! Subscriber resolution: which webhooks receive a given event.
//!
//! A webhook is eligible for event `E` when
//! - it has a subscription row for `E` or for the `Any` wildcard,
//! - it is active,
//! - its app is active and holds the permission `E` requires.
//!
//! Each eligible webhook appears once in the result however many of its
//! subscription rows matched.

use std::collections::{btree_map, BTreeMap, HashMap, HashSet};

use tracing::{debug, trace};

use crate::config::{ConfigError, ResolverConfig, UnmappedPolicy};
use crate::error::ResolveError;
use crate::event_type::EventType;
use crate::permission::{Permission, PermissionMap};
use crate::store::{ModelStore, ModelsExt};
use crate::subscriber::{App, SubscriberRef, Webhook, WebhookEvent};

/// Deduplicated set of webhooks, keyed and iterated by webhook id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSubscribers {
    webhooks: BTreeMap<String, Webhook>,
}

impl ResolvedSubscribers {
    pub fn len(&self) -> usize {
        self.webhooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.webhooks.is_empty()
    }

    pub fn contains(&self, subscriber: impl SubscriberRef) -> bool {
        self.webhooks.contains_key(subscriber.subscriber_id())
    }

    pub fn get(&self, id: &str) -> Option<&Webhook> {
        self.webhooks.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.webhooks.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Webhook> + '_ {
        self.webhooks.values()
    }

    pub fn into_vec(self) -> Vec<Webhook> {
        self.webhooks.into_values().collect()
    }

    fn insert(&mut self, webhook: Webhook) {
        self.webhooks.insert(webhook.id.clone(), webhook);
    }
}

impl IntoIterator for ResolvedSubscribers {
    type Item = Webhook;
    type IntoIter = btree_map::IntoValues<String, Webhook>;

    fn into_iter(self) -> Self::IntoIter {
        self.webhooks.into_values()
    }
}

impl<'a> IntoIterator for &'a ResolvedSubscribers {
    type Item = &'a Webhook;
    type IntoIter = btree_map::Values<'a, String, Webhook>;

    fn into_iter(self) -> Self::IntoIter {
        self.webhooks.values()
    }
}

/// Permission requirement for one resolution.
#[derive(Debug, Clone, Copy)]
enum Gate {
    Require(Permission),
    Open,
}

impl Gate {
    fn admits(&self, app: &App) -> bool {
        match self {
            Gate::Require(permission) => app.has_perm(*permission),
            Gate::Open => true,
        }
    }
}

/// Finds the webhooks that should receive an event.
///
/// Read-only and stateless between calls; share it freely across threads
/// when the store is `Sync`.
pub struct SubscriberResolver<S> {
    store: S,
    permissions: PermissionMap,
    unmapped: UnmappedPolicy,
}

impl<S: ModelStore> SubscriberResolver<S> {
    /// Resolver over `store` using the platform permission table and denying
    /// unmapped events.
    pub fn new(store: S) -> Self {
        Self {
            store,
            permissions: PermissionMap::default(),
            unmapped: UnmappedPolicy::default(),
        }
    }

    pub fn from_config(store: S, config: &ResolverConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            permissions: config.permission_map()?,
            unmapped: config.unmapped_events,
        })
    }

    pub fn with_permissions(mut self, permissions: PermissionMap) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_unmapped_policy(mut self, policy: UnmappedPolicy) -> Self {
        self.unmapped = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn permissions(&self) -> &PermissionMap {
        &self.permissions
    }

    /// Every eligible webhook for `event`.
    pub fn resolve(&self, event: EventType) -> Result<ResolvedSubscribers, ResolveError> {
        self.run(event, None)
    }

    /// Eligible webhooks for `event`, restricted to `candidates`.
    ///
    /// Equivalent to `resolve(event)` intersected with `candidates` by id.
    /// The iterator is drained once, up front.
    pub fn resolve_among<I>(
        &self,
        event: EventType,
        candidates: I,
    ) -> Result<ResolvedSubscribers, ResolveError>
    where
        I: IntoIterator,
        I::Item: SubscriberRef,
    {
        let allowed: HashSet<String> = candidates
            .into_iter()
            .map(|c| c.subscriber_id().to_string())
            .collect();
        self.run(event, Some(&allowed))
    }

    /// `resolve` or `resolve_among`, depending on whether candidates were given.
    pub fn resolve_with<I>(
        &self,
        event: EventType,
        candidates: Option<I>,
    ) -> Result<ResolvedSubscribers, ResolveError>
    where
        I: IntoIterator,
        I::Item: SubscriberRef,
    {
        match candidates {
            Some(candidates) => self.resolve_among(event, candidates),
            None => self.resolve(event),
        }
    }

    /// Resolve from a raw event identifier. Unknown identifiers have no
    /// subscribers and resolve to an empty set.
    pub fn resolve_named(&self, name: &str) -> Result<ResolvedSubscribers, ResolveError> {
        match name.parse::<EventType>() {
            Ok(event) => self.resolve(event),
            Err(err) => {
                debug!(event = name, "{}; nothing to resolve", err);
                Ok(ResolvedSubscribers::default())
            }
        }
    }

    fn gate(&self, event: EventType) -> Option<Gate> {
        match (self.permissions.required_for(event), self.unmapped) {
            (Some(permission), _) => Some(Gate::Require(permission)),
            (None, UnmappedPolicy::Allow) => Some(Gate::Open),
            (None, UnmappedPolicy::Deny) => None,
        }
    }

    fn run(
        &self,
        event: EventType,
        allowed: Option<&HashSet<String>>,
    ) -> Result<ResolvedSubscribers, ResolveError> {
        let Some(gate) = self.gate(event) else {
            debug!(%event, "no permission registered for event; denying delivery");
            return Ok(ResolvedSubscribers::default());
        };

        if allowed.is_some_and(|ids| ids.is_empty()) {
            return Ok(ResolvedSubscribers::default());
        }

        let in_scope = |webhook_id: &str| allowed.map_or(true, |ids| ids.contains(webhook_id));

        let rows = self.store.models::<WebhookEvent>().find(&|row: &WebhookEvent| {
            row.event_type.matches(event) && in_scope(row.webhook_id.as_str())
        })?;
        if rows.is_empty() {
            debug!(%event, "no subscriptions match");
            return Ok(ResolvedSubscribers::default());
        }

        let subscribed: HashSet<&str> = rows.iter().map(|row| row.webhook_id.as_str()).collect();
        let webhooks: HashMap<String, Webhook> = self
            .store
            .models::<Webhook>()
            .find(&|hook: &Webhook| hook.is_active && subscribed.contains(hook.id.as_str()))?
            .into_iter()
            .map(|hook| (hook.id.clone(), hook))
            .collect();

        let owners: HashSet<&str> = webhooks.values().map(|hook| hook.app_id.as_str()).collect();
        let eligible_apps: HashSet<String> = self
            .store
            .models::<App>()
            .find(&|app: &App| {
                app.is_active && owners.contains(app.id.as_str()) && gate.admits(app)
            })?
            .into_iter()
            .map(|app| app.id)
            .collect();

        let mut resolved = ResolvedSubscribers::default();
        for row in &rows {
            match webhooks.get(&row.webhook_id) {
                Some(hook) if eligible_apps.contains(&hook.app_id) => resolved.insert(hook.clone()),
                Some(hook) => {
                    trace!(webhook = %hook.id, app = %hook.app_id, ?gate, "owner not eligible")
                }
                None => trace!(webhook = %row.webhook_id, "webhook inactive or missing"),
            }
        }

        debug!(
            %event,
            rows = rows.len(),
            subscribers = resolved.len(),
            "resolved webhook subscribers"
        );
        Ok(resolved)
    }
}
