//! Collaborator traits consumed by the resource engine.

use crate::error::ResourceError;
use crate::models::{AclRule, GroupId, NewResource, Resource, ResourceId, UserId};

/// Persistence collaborator owning resources and their ACL rules.
///
/// Each call must observe a consistent snapshot. Multi-step mutations rely on
/// the implementation's transactional isolation.
///
/// ```ignore
/// let store: Arc<dyn ResourceStore> = Arc::new(MemoryStore::new());
/// let root = store.insert(NewResource::new("resource_group", admin, "Root"))?;
/// ```
pub trait ResourceStore: Send + Sync {
    /// Fetch a resource by id.
    ///
    /// # Errors
    ///
    /// - `Storage` if the backend fails
    fn lookup(&self, id: ResourceId) -> Result<Option<Resource>, ResourceError>;

    /// Direct children of a resource, ordered by display name.
    ///
    /// # Errors
    ///
    /// - `Storage` if the backend fails
    fn children(&self, id: ResourceId) -> Result<Vec<Resource>, ResourceError>;

    /// ACL rules attached to a resource, in insertion order.
    ///
    /// # Errors
    ///
    /// - `Storage` if the backend fails
    fn acl_rules(&self, id: ResourceId) -> Result<Vec<AclRule>, ResourceError>;

    /// Persist a new resource and assign its id.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the parent does not exist
    /// - `Conflict` if the keyname is taken
    fn insert(&self, new: NewResource) -> Result<Resource, ResourceError>;

    /// Overwrite an existing resource.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the resource does not exist
    /// - `Conflict` if the keyname is taken by another resource
    fn update(&self, resource: &Resource) -> Result<(), ResourceError>;

    /// Replace the ACL of a resource.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the resource does not exist
    fn replace_acl(&self, id: ResourceId, rules: Vec<AclRule>) -> Result<(), ResourceError>;

    /// Delete a resource, its whole subtree and their ACL rules.
    ///
    /// Returns the ids removed, the requested resource first.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the resource does not exist
    fn delete(&self, id: ResourceId) -> Result<Vec<ResourceId>, ResourceError>;

    /// Number of stored resources. Bounds ancestor walks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Principal collaborator answering identity and membership questions.
pub trait PrincipalDirectory: Send + Sync {
    /// Whether two user ids denote the same user.
    fn is_same(&self, a: UserId, b: UserId) -> bool {
        a == b
    }

    /// Whether `user` belongs to `group`.
    fn is_member(&self, user: UserId, group: GroupId) -> bool;
}
