//! Permissions and the event → required permission table.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event_type::EventType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPermission(pub String);

impl fmt::Display for UnknownPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown permission: {}", self.0)
    }
}

impl std::error::Error for UnknownPermission {}

/// A capability an app can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ManageApps,
    ManageCheckouts,
    ManageOrders,
    ManagePages,
    ManageProducts,
    ManageUsers,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::ManageApps,
        Permission::ManageCheckouts,
        Permission::ManageOrders,
        Permission::ManagePages,
        Permission::ManageProducts,
        Permission::ManageUsers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageApps => "MANAGE_APPS",
            Permission::ManageCheckouts => "MANAGE_CHECKOUTS",
            Permission::ManageOrders => "MANAGE_ORDERS",
            Permission::ManagePages => "MANAGE_PAGES",
            Permission::ManageProducts => "MANAGE_PRODUCTS",
            Permission::ManageUsers => "MANAGE_USERS",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// Which permission an app must hold for its webhooks to receive an event.
///
/// Events without an entry are "unmapped"; how those resolve is decided by
/// [`UnmappedPolicy`](crate::UnmappedPolicy), not by the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMap {
    required: HashMap<EventType, Permission>,
}

impl Default for PermissionMap {
    /// The platform table. `Any` has no entry.
    fn default() -> Self {
        let required = EventType::ALL
            .iter()
            .filter_map(|event| event.default_permission().map(|p| (*event, p)))
            .collect();
        Self { required }
    }
}

impl PermissionMap {
    /// A map with no entries: every event is unmapped.
    pub fn empty() -> Self {
        Self {
            required: HashMap::new(),
        }
    }

    pub fn required_for(&self, event: EventType) -> Option<Permission> {
        self.required.get(&event).copied()
    }

    pub fn with(mut self, event: EventType, permission: Permission) -> Self {
        self.set(event, permission);
        self
    }

    pub fn without(mut self, event: EventType) -> Self {
        self.remove(event);
        self
    }

    pub fn set(&mut self, event: EventType, permission: Permission) -> Option<Permission> {
        self.required.insert(event, permission)
    }

    pub fn remove(&mut self, event: EventType) -> Option<Permission> {
        self.required.remove(&event)
    }

    pub fn len(&self) -> usize {
        self.required.len()
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }
}
