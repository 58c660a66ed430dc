//! ACL resolution.
//!
//! Rules are gathered from every node on the root-to-resource path. A rule on
//! an ancestor applies only if it propagates. Each selected rule matching the
//! principal and the resource class adds the class permissions it covers to
//! `allow` or `deny`. Requirements that fail move their permission to `mask`.
//! The effective set is `allow - deny - mask`, so a deny anywhere on the path
//! wins regardless of rule order.

use std::collections::BTreeSet;

use resource_sdk::{
    AclAction, Permission, PermissionSets, Principal, Resource, ResourceError, UserId,
};
use tracing::{debug, warn};

use super::ResourceService;

impl ResourceService {
    /// Allow, deny and mask sets of `user` on `resource`.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the resource class is not registered
    /// - `CycleDetected` if the ancestor walk or requirement recursion
    ///   exceeds its bound
    /// - `NotFound` for a dangling parent reference
    #[tracing::instrument(
        level = "debug",
        skip(self, resource),
        fields(resource_id = %resource.id, cls = %resource.cls)
    )]
    pub fn permission_sets(
        &self,
        resource: &Resource,
        user: UserId,
    ) -> Result<PermissionSets, ResourceError> {
        self.resolve(resource, user, 0)
    }

    /// Effective permissions of `user` on `resource`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::permission_sets`].
    pub fn permissions(
        &self,
        resource: &Resource,
        user: UserId,
    ) -> Result<BTreeSet<Permission>, ResourceError> {
        Ok(self.permission_sets(resource, user)?.effective())
    }

    /// Whether `perm` is effective for `user` on `resource`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::permission_sets`].
    pub fn has_permission(
        &self,
        resource: &Resource,
        perm: &Permission,
        user: UserId,
    ) -> Result<bool, ResourceError> {
        Ok(self.permissions(resource, user)?.contains(perm))
    }

    /// Guard form taking the permission by scope and name.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the permission is not registered
    /// - same as [`Self::permission_sets`]
    pub fn has_scope_permission(
        &self,
        resource: &Resource,
        scope: &str,
        name: &str,
        user: UserId,
    ) -> Result<bool, ResourceError> {
        let perm = self.registry().permission(scope, name)?;
        self.has_permission(resource, &perm, user)
    }

    /// Fail with `Forbidden` unless `perm` is effective.
    ///
    /// # Errors
    ///
    /// - `Forbidden` naming the permission and the resource
    /// - same as [`Self::permission_sets`]
    pub fn require_permission(
        &self,
        resource: &Resource,
        perm: &Permission,
        user: UserId,
    ) -> Result<(), ResourceError> {
        if self.has_permission(resource, perm, user)? {
            return Ok(());
        }
        warn!(
            resource_id = %resource.id,
            permission = %perm,
            user = %user,
            "Permission denied"
        );
        Err(ResourceError::forbidden(format!(
            "{perm} on resource {}",
            resource.id
        )))
    }

    fn resolve(
        &self,
        resource: &Resource,
        user: UserId,
        depth: usize,
    ) -> Result<PermissionSets, ResourceError> {
        if depth > self.config().max_depth {
            return Err(ResourceError::CycleDetected(resource.id));
        }

        let registry = self.registry();
        let class_permissions = registry.class_permissions(&resource.cls)?;
        let mut sets = PermissionSets::default();

        let mut path = self.parents(resource)?;
        path.push(resource.clone());

        for node in &path {
            let own = node.id == resource.id;
            for rule in self.store().acl_rules(node.id)? {
                if !(rule.propagate || own)
                    || !rule.matches_identity(&resource.cls)
                    || !self.principal_matches(&rule.principal, user)
                {
                    continue;
                }
                let bucket = match rule.action {
                    AclAction::Allow => &mut sets.allow,
                    AclAction::Deny => &mut sets.deny,
                };
                bucket.extend(
                    class_permissions
                        .iter()
                        .filter(|perm| rule.matches_permission(perm))
                        .cloned(),
                );
            }
        }

        for req in registry.requirements_for(&resource.cls)? {
            if !class_permissions.contains(&req.dst) {
                continue;
            }
            if req
                .cls
                .as_deref()
                .is_some_and(|cls| !registry.is_instance(resource, cls))
            {
                continue;
            }

            let holds = match req.attr.as_deref() {
                None => sets.allow.contains(&req.src) && !sets.deny.contains(&req.src),
                Some(attr) => match resource.reference(attr) {
                    None => false,
                    Some(id) => match self.store().lookup(id)? {
                        None => false,
                        Some(target) => self
                            .resolve(&target, user, depth + 1)?
                            .effective()
                            .contains(&req.src),
                    },
                },
            };
            if !holds {
                sets.mask.insert(req.dst.clone());
            }
        }

        debug!(
            allow = sets.allow.len(),
            deny = sets.deny.len(),
            mask = sets.mask.len(),
            "Permission sets resolved"
        );
        Ok(sets)
    }

    fn principal_matches(&self, principal: &Principal, user: UserId) -> bool {
        match *principal {
            Principal::User(id) => self.principals().is_same(id, user),
            Principal::Group(group) => self.principals().is_member(user, group),
        }
    }
}
