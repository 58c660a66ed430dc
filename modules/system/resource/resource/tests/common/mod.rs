#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use resource::builtin::{self, classes, scopes};
use resource::{
    Attribute, MemoryStore, PermissionTarget, Registry, RegistryBuilder, ResourceClass,
    ResourceConfig, ResourceService, Serializer,
};
use resource_sdk::{AclRule, GroupId, NewResource, Permission, Resource, ResourceStore, UserId};
use static_principal_plugin::{Service as StaticPrincipals, StaticPrincipalPluginConfig};

pub const DOC_SCOPE: &str = "doc";
pub const DOC_CLASS: &str = "document";

const PRINCIPALS: &str = r"
users:
  - id: 00000000-0000-0000-0000-00000000000a
    keyname: admin
  - id: 00000000-0000-0000-0000-00000000000b
    keyname: alice
  - id: 00000000-0000-0000-0000-00000000000c
    keyname: bob
groups:
  - id: 00000000-0000-0000-0000-0000000000f1
    keyname: editors
    members:
      - 00000000-0000-0000-0000-00000000000b
";

fn document_parent(registry: &Registry, parent: Option<&Resource>) -> bool {
    parent.is_some_and(|p| registry.is_instance(p, classes::RESOURCE_GROUP))
}

pub fn registry() -> Registry {
    let mut b = RegistryBuilder::new();
    builtin::register(&mut b).unwrap();

    b.register_scope(DOC_SCOPE, "Document").unwrap();
    b.register_permission(PermissionTarget::Scope(DOC_SCOPE), "view", "View")
        .unwrap();
    b.register_permission(PermissionTarget::Scope(DOC_SCOPE), "edit", "Edit")
        .unwrap();
    b.register_class(
        ResourceClass::new(DOC_CLASS)
            .label("Document")
            .inherits(classes::RESOURCE)
            .scopes([scopes::RESOURCE, scopes::METADATA, DOC_SCOPE])
            .parent_policy(document_parent),
    )
    .unwrap();
    b.register_serializer(
        Serializer::new(DOC_CLASS, DOC_CLASS)
            .attribute(
                Attribute::property("body")
                    .read(Permission::new(DOC_SCOPE, "view"))
                    .write(Permission::new(DOC_SCOPE, "edit")),
            )
            .attribute(
                Attribute::resource_relationship("template")
                    .read(Permission::new(DOC_SCOPE, "view"))
                    .write(Permission::new(DOC_SCOPE, "edit")),
            ),
    )
    .unwrap();
    b.build().unwrap()
}

pub struct World {
    pub store: Arc<MemoryStore>,
    pub service: ResourceService,
    pub admin: UserId,
    pub alice: UserId,
    pub bob: UserId,
    pub editors: GroupId,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(ResourceConfig::default())
    }

    pub fn with_config(config: ResourceConfig) -> Self {
        let cfg: StaticPrincipalPluginConfig = match serde_saphyr::from_str(PRINCIPALS) {
            Ok(cfg) => cfg,
            Err(e) => panic!("failed to parse principals: {e}"),
        };
        let principals = StaticPrincipals::from_config(&cfg).unwrap();
        let admin = principals.user("admin").unwrap();
        let alice = principals.user("alice").unwrap();
        let bob = principals.user("bob").unwrap();
        let editors = principals.group("editors").unwrap();

        let store = Arc::new(MemoryStore::new());
        let service = ResourceService::new(
            Arc::new(registry()),
            store.clone(),
            Arc::new(principals),
            config,
        );
        Self {
            store,
            service,
            admin,
            alice,
            bob,
            editors,
        }
    }

    pub fn root(&self) -> Resource {
        self.store
            .insert(NewResource::new(classes::RESOURCE_GROUP, self.admin, "Root"))
            .unwrap()
    }

    pub fn group(&self, parent: &Resource, name: &str) -> Resource {
        self.store
            .insert(NewResource::new(classes::RESOURCE_GROUP, self.admin, name).parent(parent.id))
            .unwrap()
    }

    pub fn document(&self, parent: &Resource, name: &str) -> Resource {
        self.store
            .insert(NewResource::new(DOC_CLASS, self.admin, name).parent(parent.id))
            .unwrap()
    }

    pub fn set_acl(&self, resource: &Resource, rules: Vec<AclRule>) {
        self.store.replace_acl(resource.id, rules).unwrap();
    }
}
