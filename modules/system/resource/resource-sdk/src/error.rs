//! Error taxonomy for the resource module.

use crate::models::ResourceId;

/// Errors surfaced by resolution, serialization and tree operations.
///
/// Every variant reaches the caller unmodified; mapping to user-visible
/// responses is the boundary layer's job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// A permission check failed for an attribute or an action.
    #[error("forbidden: {subject}")]
    Forbidden { subject: String },

    /// A parent/child class compatibility rule was violated.
    #[error("structural error: {0}")]
    Structural(String),

    /// A referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The ancestor walk exceeded the depth bound.
    #[error("cycle detected while walking ancestors of resource {0}")]
    CycleDetected(ResourceId),

    /// Missing class, scope or permission registration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The permission is already registered for that scope.
    #[error("permission {scope}.{name} is already registered")]
    DuplicatePermission { scope: String, name: String },

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A payload value has the wrong shape for its attribute.
    #[error("invalid value for `{attribute}`: {reason}")]
    InvalidValue { attribute: String, reason: String },

    /// The storage collaborator failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ResourceError {
    #[must_use]
    pub fn forbidden(subject: impl Into<String>) -> Self {
        Self::Forbidden {
            subject: subject.into(),
        }
    }

    /// Denied write on a serializer attribute.
    #[must_use]
    pub fn forbidden_attribute(name: &str) -> Self {
        Self::forbidden(format!("attribute '{name}' forbidden"))
    }

    #[must_use]
    pub fn resource_not_found(id: ResourceId) -> Self {
        Self::NotFound {
            kind: "resource",
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_value(attribute: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors that indicate a broken tree or registry
    /// rather than a rejected request.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CycleDetected(_) | Self::Configuration(_) | Self::DuplicatePermission { .. }
        )
    }
}
