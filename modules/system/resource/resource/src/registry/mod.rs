//! Scope/permission registry and resource class catalog.
//!
//! Registration happens once at startup on a [`RegistryBuilder`]. Calling
//! [`RegistryBuilder::build`] validates every cross reference, flattens the
//! permission set of each class, binds serializer attributes to permissions
//! and freezes the result into an immutable [`Registry`]. A frozen registry
//! is shared behind `Arc` and read without locking.

mod class;
mod scope;

use std::collections::{BTreeSet, HashMap};

use resource_sdk::{Permission, Resource, ResourceError};
use tracing::info;

use crate::serialize::{BoundSerializer, Serializer};

pub use class::{ChildCheck, ParentCheck, ResourceClass};
pub use scope::{Requirement, Scope};

/// Where a permission is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionTarget<'a> {
    /// An explicitly declared scope.
    Scope(&'a str),
    /// The identity scope of a class: a scope named after the class tag,
    /// created on first use and contributed to that class.
    Class(&'a str),
}

/// Mutable registration surface used during startup.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    scopes: HashMap<String, Scope>,
    classes: Vec<ResourceClass>,
    serializers: Vec<Serializer>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a scope.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the scope is already declared
    pub fn register_scope(
        &mut self,
        id: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<(), ResourceError> {
        let id = id.into();
        if self.scopes.contains_key(&id) {
            return Err(ResourceError::Configuration(format!(
                "scope '{id}' is already declared"
            )));
        }
        self.scopes.insert(id.clone(), Scope::new(id, label));
        Ok(())
    }

    /// Add a permission to a scope.
    ///
    /// # Errors
    ///
    /// - `DuplicatePermission` if the scope already defines `name`
    /// - `Configuration` if an explicit scope target was never declared
    pub fn register_permission(
        &mut self,
        target: PermissionTarget<'_>,
        name: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<Permission, ResourceError> {
        let scope = match target {
            PermissionTarget::Scope(id) => self.scopes.get_mut(id).ok_or_else(|| {
                ResourceError::Configuration(format!("scope '{id}' is not declared"))
            })?,
            PermissionTarget::Class(tag) => self
                .scopes
                .entry(tag.to_owned())
                .or_insert_with(|| Scope::new(tag, tag)),
        };

        let name = name.into();
        if !scope.insert_permission(name.clone(), label.into()) {
            return Err(ResourceError::DuplicatePermission {
                scope: scope.id().to_owned(),
                name,
            });
        }
        Ok(Permission::new(scope.id(), name))
    }

    /// Attach a requirement to a scope. Permissions are validated on build.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the scope is not declared
    pub fn register_requirement(
        &mut self,
        scope: &str,
        requirement: Requirement,
    ) -> Result<(), ResourceError> {
        let entry = self.scopes.get_mut(scope).ok_or_else(|| {
            ResourceError::Configuration(format!("scope '{scope}' is not declared"))
        })?;
        entry.push_requirement(requirement);
        Ok(())
    }

    /// Add a class to the catalog.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the tag is already registered
    pub fn register_class(&mut self, class: ResourceClass) -> Result<(), ResourceError> {
        if self.classes.iter().any(|c| c.tag() == class.tag()) {
            return Err(ResourceError::Configuration(format!(
                "class '{}' is already registered",
                class.tag()
            )));
        }
        self.classes.push(class);
        Ok(())
    }

    /// Add a serializer. Registration order is the composite member order.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the identity is already registered
    pub fn register_serializer(&mut self, serializer: Serializer) -> Result<(), ResourceError> {
        if self
            .serializers
            .iter()
            .any(|s| s.identity() == serializer.identity())
        {
            return Err(ResourceError::Configuration(format!(
                "serializer '{}' is already registered",
                serializer.identity()
            )));
        }
        self.serializers.push(serializer);
        Ok(())
    }

    /// Validate and freeze.
    ///
    /// # Errors
    ///
    /// - `Configuration` for unknown parent classes, inheritance cycles,
    ///   unknown scopes, requirements or serializer attributes referencing
    ///   unknown permissions or classes
    pub fn build(self) -> Result<Registry, ResourceError> {
        let Self {
            scopes,
            classes,
            serializers,
        } = self;

        let mut by_tag: HashMap<String, ResourceClass> = HashMap::with_capacity(classes.len());
        for mut class in classes {
            let tag = class.tag().to_owned();
            if scopes.contains_key(&tag) {
                class.push_scope(&tag);
            }
            by_tag.insert(tag, class);
        }

        for class in by_tag.values() {
            let mut hops = 0usize;
            let mut current = class.parent();
            while let Some(parent) = current {
                let parent_class = by_tag.get(parent).ok_or_else(|| {
                    ResourceError::Configuration(format!(
                        "class '{}' inherits unknown class '{parent}'",
                        class.tag()
                    ))
                })?;
                hops += 1;
                if hops > by_tag.len() {
                    return Err(ResourceError::Configuration(format!(
                        "inheritance cycle through class '{}'",
                        class.tag()
                    )));
                }
                current = parent_class.parent();
            }
        }

        let mut entries = HashMap::with_capacity(by_tag.len());
        for (tag, class) in by_tag {
            let mut permissions = BTreeSet::new();
            for scope_id in class.scope_ids() {
                let scope = scopes.get(scope_id).ok_or_else(|| {
                    ResourceError::Configuration(format!(
                        "class '{tag}' contributes unknown scope '{scope_id}'"
                    ))
                })?;
                permissions.extend(scope.permissions());
            }
            entries.insert(tag, ClassEntry { class, permissions });
        }

        let mut registry = Registry {
            scopes,
            classes: entries,
            serializers: Vec::new(),
        };

        for scope in registry.scopes.values() {
            for req in scope.requirements() {
                registry.ensure_permission(&req.src)?;
                registry.ensure_permission(&req.dst)?;
                if let Some(cls) = &req.cls {
                    registry.class(cls)?;
                }
            }
        }

        let mut bound = Vec::with_capacity(serializers.len());
        for serializer in serializers {
            bound.push(serializer.bind(&registry)?);
        }
        registry.serializers = bound;

        info!(
            scopes = registry.scopes.len(),
            classes = registry.classes.len(),
            serializers = registry.serializers.len(),
            "Resource registry frozen"
        );
        Ok(registry)
    }
}

#[derive(Debug)]
struct ClassEntry {
    class: ResourceClass,
    permissions: BTreeSet<Permission>,
}

/// Frozen registry: scopes, classes with their flattened permission sets, and
/// bound serializers.
#[derive(Debug)]
pub struct Registry {
    scopes: HashMap<String, Scope>,
    classes: HashMap<String, ClassEntry>,
    serializers: Vec<BoundSerializer>,
}

impl Registry {
    #[must_use]
    pub fn scope(&self, id: &str) -> Option<&Scope> {
        self.scopes.get(id)
    }

    /// Catalog entry for a class tag.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the tag was never registered
    pub fn class(&self, tag: &str) -> Result<&ResourceClass, ResourceError> {
        self.classes
            .get(tag)
            .map(|e| &e.class)
            .ok_or_else(|| unknown_class(tag))
    }

    /// Union of the permissions of every scope the class contributes.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the tag was never registered
    pub fn class_permissions(&self, tag: &str) -> Result<&BTreeSet<Permission>, ResourceError> {
        self.classes
            .get(tag)
            .map(|e| &e.permissions)
            .ok_or_else(|| unknown_class(tag))
    }

    /// Look up a registered permission.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the scope or the permission is unknown
    pub fn permission(&self, scope: &str, name: &str) -> Result<Permission, ResourceError> {
        self.scopes
            .get(scope)
            .and_then(|s| s.permission(name))
            .ok_or_else(|| {
                ResourceError::Configuration(format!("permission {scope}.{name} is not registered"))
            })
    }

    fn ensure_permission(&self, perm: &Permission) -> Result<(), ResourceError> {
        self.permission(perm.scope(), perm.name()).map(|_| ())
    }

    /// Whether `tag` is `ancestor` or inherits from it.
    #[must_use]
    pub fn is_subclass(&self, tag: &str, ancestor: &str) -> bool {
        let mut current = Some(tag);
        while let Some(t) = current {
            if t == ancestor {
                return true;
            }
            current = self.classes.get(t).and_then(|e| e.class.parent());
        }
        false
    }

    #[must_use]
    pub fn is_instance(&self, resource: &Resource, tag: &str) -> bool {
        self.is_subclass(&resource.cls, tag)
    }

    /// Requirements declared by the scopes a class contributes.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the tag was never registered
    pub fn requirements_for(&self, tag: &str) -> Result<Vec<&Requirement>, ResourceError> {
        let class = self.class(tag)?;
        Ok(class
            .scope_ids()
            .iter()
            .filter_map(|id| self.scopes.get(id))
            .flat_map(Scope::requirements)
            .collect())
    }

    /// Bound serializers in registration order.
    #[must_use]
    pub fn serializers(&self) -> &[BoundSerializer] {
        &self.serializers
    }

    #[must_use]
    pub fn serializer(&self, identity: &str) -> Option<&BoundSerializer> {
        self.serializers.iter().find(|s| s.identity() == identity)
    }
}

fn unknown_class(tag: &str) -> ResourceError {
    ResourceError::Configuration(format!("resource class '{tag}' is not registered"))
}
