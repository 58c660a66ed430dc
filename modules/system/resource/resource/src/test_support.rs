#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Fixtures shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use resource_sdk::{
    AclRule, GroupId, NewResource, Permission, Principal, PrincipalDirectory, Resource,
    ResourceStore, UserId,
};
use uuid::Uuid;

use crate::builtin::{self, classes, permissions, scopes};
use crate::config::ResourceConfig;
use crate::domain::ResourceService;
use crate::infra::MemoryStore;
use crate::registry::{PermissionTarget, Registry, RegistryBuilder, Requirement, ResourceClass};
use crate::serialize::{Attribute, Serializer};

pub const DOC_SCOPE: &str = "doc";
pub const DOC_CLASS: &str = "document";

pub fn doc(name: &str) -> Permission {
    Permission::new(DOC_SCOPE, name)
}

pub fn allow_all(user: UserId) -> AclRule {
    AclRule::allow(Principal::User(user))
}

/// Group memberships held in a map.
#[derive(Default)]
pub struct Directory {
    groups: HashMap<GroupId, HashSet<UserId>>,
}

impl Directory {
    pub fn with_member(mut self, group: GroupId, user: UserId) -> Self {
        self.groups.entry(group).or_default().insert(user);
        self
    }
}

impl PrincipalDirectory for Directory {
    fn is_member(&self, user: UserId, group: GroupId) -> bool {
        self.groups.get(&group).is_some_and(|m| m.contains(&user))
    }
}

fn document_parent(registry: &Registry, parent: Option<&Resource>) -> bool {
    parent.is_some_and(|p| registry.is_instance(p, classes::RESOURCE_GROUP))
}

/// Built-ins plus a `document` class with its own `doc` scope:
///
/// - `doc.export` requires `doc.view`
/// - `doc.publish` requires `resource.read` on the parent
/// - serializer `document`: `title` (view/edit), `pages` (view, read-only),
///   `source` (relationship, view/edit)
///
/// Returned unfrozen so tests can register more before building.
pub fn builder() -> RegistryBuilder {
    let mut b = RegistryBuilder::new();
    builtin::register(&mut b).unwrap();

    b.register_scope(DOC_SCOPE, "Document").unwrap();
    for name in ["view", "edit", "export", "publish"] {
        b.register_permission(PermissionTarget::Scope(DOC_SCOPE), name, name)
            .unwrap();
    }
    b.register_requirement(DOC_SCOPE, Requirement::new(doc("export"), doc("view")))
        .unwrap();
    b.register_requirement(
        DOC_SCOPE,
        Requirement::new(
            doc("publish"),
            Permission::new(scopes::RESOURCE, permissions::READ),
        )
        .on_attribute("parent"),
    )
    .unwrap();

    b.register_class(
        ResourceClass::new(DOC_CLASS)
            .inherits(classes::RESOURCE)
            .scopes([scopes::RESOURCE, scopes::METADATA, DOC_SCOPE])
            .parent_policy(document_parent),
    )
    .unwrap();

    b.register_serializer(
        Serializer::new(DOC_CLASS, DOC_CLASS)
            .target_scope(DOC_SCOPE)
            .attribute(Attribute::property("title").read("view").write("edit"))
            .attribute(Attribute::property("pages").read("view"))
            .attribute(Attribute::relationship("source").read("view").write("edit")),
    )
    .unwrap();
    b
}

pub fn registry() -> Registry {
    builder().build().unwrap()
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub service: ResourceService,
    pub admin: UserId,
    pub member: UserId,
    pub outsider: UserId,
    pub group: GroupId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(ResourceConfig::default())
    }

    pub fn with_config(config: ResourceConfig) -> Self {
        Self::with_registry(registry(), config)
    }

    pub fn with_registry(registry: Registry, config: ResourceConfig) -> Self {
        let admin = Uuid::new_v4();
        let member = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let group = Uuid::new_v4();

        let store = Arc::new(MemoryStore::new());
        let principals = Directory::default().with_member(group, member);
        let service = ResourceService::new(
            Arc::new(registry),
            store.clone(),
            Arc::new(principals),
            config,
        );
        Self {
            store,
            service,
            admin,
            member,
            outsider,
            group,
        }
    }

    pub fn insert(&self, new: NewResource) -> Resource {
        self.store.insert(new).unwrap()
    }

    pub fn group_root(&self) -> Resource {
        self.insert(NewResource::new(classes::RESOURCE_GROUP, self.admin, "Root"))
    }

    /// Append a rule to the resource's ACL.
    pub fn grant(&self, resource: &Resource, rule: AclRule) {
        let mut rules = self.store.acl_rules(resource.id).unwrap();
        rules.push(rule);
        self.store.replace_acl(resource.id, rules).unwrap();
    }
}
