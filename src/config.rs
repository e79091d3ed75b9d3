//! Resolver configuration, loadable from TOML.
//!
//! ```toml
//! unmapped_events = "deny"
//!
//! [permissions]
//! notify_user = "MANAGE_APPS"
//! page_deleted = "none"
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::event_type::{EventType, UnknownEventType};
use crate::permission::{Permission, PermissionMap};

/// How an event with no required permission resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// Nobody receives it.
    #[default]
    Deny,
    /// Every active, subscribed webhook of an active app receives it.
    Allow,
}

/// One entry of the `[permissions]` table: a permission codename, or `"none"`
/// to drop the event's requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PermissionOverride {
    Require(Permission),
    Unmapped,
}

impl TryFrom<String> for PermissionOverride {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("none") {
            return Ok(PermissionOverride::Unmapped);
        }
        value
            .parse::<Permission>()
            .map(PermissionOverride::Require)
            .map_err(|e| e.to_string())
    }
}

impl From<PermissionOverride> for String {
    fn from(value: PermissionOverride) -> Self {
        match value {
            PermissionOverride::Require(permission) => permission.as_str().to_string(),
            PermissionOverride::Unmapped => "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse(String),
    UnknownEventType(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "failed to read config {}: {}", path, message)
            }
            ConfigError::Parse(message) => write!(f, "invalid resolver config: {}", message),
            ConfigError::UnknownEventType(name) => {
                write!(f, "invalid resolver config: unknown event type {}", name)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<UnknownEventType> for ConfigError {
    fn from(err: UnknownEventType) -> Self {
        ConfigError::UnknownEventType(err.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    pub unmapped_events: UnmappedPolicy,
    /// Keyed by event wire name; applied on top of the platform permission table.
    pub permissions: BTreeMap<String, PermissionOverride>,
}

impl ResolverConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.permission_map()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    pub fn with_unmapped_events(mut self, policy: UnmappedPolicy) -> Self {
        self.unmapped_events = policy;
        self
    }

    pub fn with_override(mut self, event: EventType, entry: PermissionOverride) -> Self {
        self.permissions.insert(event.as_str().to_string(), entry);
        self
    }

    /// The platform table with this config's overrides applied.
    pub fn permission_map(&self) -> Result<PermissionMap, ConfigError> {
        let mut map = PermissionMap::default();
        for (name, entry) in &self.permissions {
            let event: EventType = name.parse()?;
            match entry {
                PermissionOverride::Require(permission) => {
                    map.set(event, *permission);
                }
                PermissionOverride::Unmapped => {
                    map.remove(event);
                }
            }
        }
        Ok(map)
    }
}
