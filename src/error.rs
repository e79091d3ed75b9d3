use std::fmt;

use crate::store::ModelError;

/// Failure while resolving subscribers or storing their deliveries.
///
/// Empty results are not errors: an unknown event, an inactive webhook or a
/// missing permission all resolve to an empty set. Only the store can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Reading subscribers, subscriptions or apps failed.
    Store(ModelError),
    /// Writing a delivery plan failed; nothing from that plan was stored.
    Plan(ModelError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Store(err) => write!(f, "subscriber lookup failed: {}", err),
            ResolveError::Plan(err) => write!(f, "storing delivery plan failed: {}", err),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Store(err) | ResolveError::Plan(err) => Some(err),
        }
    }
}

impl From<ModelError> for ResolveError {
    fn from(err: ModelError) -> Self {
        ResolveError::Store(err)
    }
}
