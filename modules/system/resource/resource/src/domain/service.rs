//! Resource service: tree reads and guarded tree mutations.

use std::sync::Arc;

use resource_sdk::{
    AclRule, NewResource, Payload, PrincipalDirectory, Resource, ResourceError, ResourceId,
    ResourceStore, UserId,
};
use tracing::{info, warn};

use crate::builtin::{permissions, resource_permission};
use crate::config::ResourceConfig;
use crate::registry::Registry;
use crate::serialize::CompositeSerializer;

/// Entry point of the resource module.
///
/// Holds the frozen registry and the two collaborators. Every operation is
/// synchronous and scoped to the call.
pub struct ResourceService {
    registry: Arc<Registry>,
    store: Arc<dyn ResourceStore>,
    principals: Arc<dyn PrincipalDirectory>,
    config: ResourceConfig,
}

impl ResourceService {
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn ResourceStore>,
        principals: Arc<dyn PrincipalDirectory>,
        config: ResourceConfig,
    ) -> Self {
        Self {
            registry,
            store,
            principals,
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &dyn ResourceStore {
        self.store.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn principals(&self) -> &dyn PrincipalDirectory {
        self.principals.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    /// Fetch a resource.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no resource has this id
    /// - `Storage` if the store fails
    pub fn get(&self, id: ResourceId) -> Result<Resource, ResourceError> {
        self.store
            .lookup(id)?
            .ok_or_else(|| ResourceError::resource_not_found(id))
    }

    /// Ancestors of `resource`, root first, excluding the resource itself.
    ///
    /// # Errors
    ///
    /// - `CycleDetected` if the walk exceeds the configured depth or the
    ///   number of stored resources
    /// - `NotFound` if a parent id points nowhere
    pub fn parents(&self, resource: &Resource) -> Result<Vec<Resource>, ResourceError> {
        let bound = self.config.max_depth.min(self.store.len());
        let mut chain = Vec::new();
        let mut next = resource.parent_id;
        while let Some(id) = next {
            if chain.len() >= bound {
                return Err(ResourceError::CycleDetected(resource.id));
            }
            let parent = self.get(id)?;
            next = parent.parent_id;
            chain.push(parent);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Direct children ordered by display name.
    ///
    /// # Errors
    ///
    /// - `Storage` if the store fails
    pub fn children(&self, resource: &Resource) -> Result<Vec<Resource>, ResourceError> {
        self.store.children(resource.id)
    }

    /// Validate moving `resource` under `new_parent` without mutating
    /// anything.
    ///
    /// Checks, in order: `resource.children-manage` on the new parent, the
    /// child class's parent policy, the parent class's child policy (unless
    /// disabled in config) and that the new parent is not the resource
    /// itself or one of its descendants.
    ///
    /// # Errors
    ///
    /// - `Forbidden` if the principal cannot manage the new parent's children
    /// - `Structural` if a class policy refuses or the move would create a
    ///   cycle
    #[tracing::instrument(
        skip(self, resource, new_parent),
        fields(resource_id = %resource.id, new_parent_id = %new_parent.id)
    )]
    pub fn check_reparent(
        &self,
        resource: &Resource,
        new_parent: &Resource,
        user: UserId,
    ) -> Result<(), ResourceError> {
        self.require_permission(
            new_parent,
            &resource_permission(permissions::CHILDREN_MANAGE),
            user,
        )?;
        self.check_placement(resource, new_parent)?;

        if new_parent.id == resource.id
            || self
                .parents(new_parent)?
                .iter()
                .any(|p| p.id == resource.id)
        {
            warn!("Refusing to move a resource under itself");
            return Err(ResourceError::Structural(format!(
                "resource {} cannot be moved under itself or its descendant {}",
                resource.id, new_parent.id
            )));
        }
        Ok(())
    }

    /// Move `resource` under `new_parent_id` and persist the change.
    ///
    /// On failure neither the store nor `resource` is modified.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the new parent does not exist
    /// - every error of [`Self::check_reparent`]
    /// - store failures
    pub fn set_parent(
        &self,
        resource: &mut Resource,
        new_parent_id: ResourceId,
        user: UserId,
    ) -> Result<(), ResourceError> {
        let new_parent = self.get(new_parent_id)?;
        self.check_reparent(resource, &new_parent, user)?;

        let mut moved = resource.clone();
        moved.parent_id = Some(new_parent.id);
        self.store.update(&moved)?;

        info!(
            resource_id = %moved.id,
            parent_id = %new_parent.id,
            "Resource moved"
        );
        *resource = moved;
        Ok(())
    }

    /// Create a resource under `parent_id`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the parent does not exist
    /// - `Forbidden` without `resource.children-manage` on the parent
    /// - `Structural` if a class policy refuses the placement
    /// - `Configuration` if the class is not registered
    /// - `Conflict` if the keyname is taken
    #[tracing::instrument(skip(self, new), fields(cls = %new.cls))]
    pub fn create_child(
        &self,
        parent_id: ResourceId,
        mut new: NewResource,
        user: UserId,
    ) -> Result<Resource, ResourceError> {
        let parent = self.get(parent_id)?;
        self.require_permission(
            &parent,
            &resource_permission(permissions::CHILDREN_MANAGE),
            user,
        )?;

        new.parent_id = Some(parent.id);
        // Not persisted yet, the id is a placeholder.
        let candidate = new.clone().into_resource(ResourceId(0));
        self.check_placement(&candidate, &parent)?;

        let created = self.store.insert(new)?;
        info!(resource_id = %created.id, parent_id = %parent.id, "Resource created");
        Ok(created)
    }

    /// Delete a resource and its whole subtree.
    ///
    /// # Errors
    ///
    /// - `Forbidden` without `resource.delete` on the resource
    /// - store failures
    #[tracing::instrument(skip(self, resource), fields(resource_id = %resource.id))]
    pub fn delete(
        &self,
        resource: &Resource,
        user: UserId,
    ) -> Result<Vec<ResourceId>, ResourceError> {
        self.require_permission(resource, &resource_permission(permissions::DELETE), user)?;
        let removed = self.store.delete(resource.id)?;
        info!(removed = removed.len(), "Resource subtree deleted");
        Ok(removed)
    }

    /// Replace the ACL of a resource.
    ///
    /// # Errors
    ///
    /// - `Forbidden` without `resource.change-permissions` on the resource
    /// - store failures
    #[tracing::instrument(
        skip(self, resource, rules),
        fields(resource_id = %resource.id, rules = rules.len())
    )]
    pub fn replace_acl(
        &self,
        resource: &Resource,
        rules: Vec<AclRule>,
        user: UserId,
    ) -> Result<(), ResourceError> {
        self.require_permission(
            resource,
            &resource_permission(permissions::CHANGE_PERMISSIONS),
            user,
        )?;
        self.store.replace_acl(resource.id, rules)?;
        info!("ACL replaced");
        Ok(())
    }

    /// Composite serializer for one request.
    #[must_use]
    pub fn serializer(
        &self,
        resource: Resource,
        user: UserId,
        payload: Option<Payload>,
    ) -> CompositeSerializer<'_> {
        CompositeSerializer::new(self, resource, user, payload)
    }

    fn check_placement(&self, child: &Resource, parent: &Resource) -> Result<(), ResourceError> {
        let child_class = self.registry.class(&child.cls)?;
        if !child_class.check_parent(&self.registry, Some(parent)) {
            warn!(child = %child.cls, parent = %parent.cls, "Parent class refused");
            return Err(ResourceError::Structural(format!(
                "class '{}' cannot be placed under class '{}'",
                child.cls, parent.cls
            )));
        }

        if self.config.enforce_check_child {
            let parent_class = self.registry.class(&parent.cls)?;
            if !parent_class.check_child(&self.registry, parent, child) {
                warn!(child = %child.cls, parent = %parent.cls, "Child class refused");
                return Err(ResourceError::Structural(format!(
                    "class '{}' does not accept children of class '{}'",
                    parent.cls, child.cls
                )));
            }
        }
        Ok(())
    }
}
