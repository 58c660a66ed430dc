//! Built-in scopes, classes and the `resource` serializer.
//!
//! Every deployment registers these before its own classes:
//!
//! ```ignore
//! let mut builder = RegistryBuilder::new();
//! builtin::register(&mut builder)?;
//! ```

use resource_sdk::{Permission, Resource, ResourceError};
use serde_json::{Value, json};

use crate::registry::{PermissionTarget, Registry, RegistryBuilder, ResourceClass};
use crate::serialize::{Attribute, Pass, Serializer, reference_id};

/// Scope identifiers.
pub mod scopes {
    pub const RESOURCE: &str = "resource";
    pub const METADATA: &str = "metadata";
}

/// Permission names of the `resource` scope.
pub mod permissions {
    pub const READ: &str = "read";
    pub const CREATE: &str = "create";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const CHANGE_PERMISSIONS: &str = "change-permissions";
    pub const CHILDREN_MANAGE: &str = "children-manage";
}

/// Permission names of the `metadata` scope.
pub mod metadata_permissions {
    pub const READ: &str = "read";
    pub const WRITE: &str = "write";
}

/// Class tags.
pub mod classes {
    pub const RESOURCE: &str = "resource";
    pub const RESOURCE_GROUP: &str = "resource_group";
}

/// Identity of the built-in serializer.
pub const RESOURCE_SERIALIZER: &str = "resource";

#[must_use]
pub fn resource_permission(name: &str) -> Permission {
    Permission::new(scopes::RESOURCE, name)
}

#[must_use]
pub fn metadata_permission(name: &str) -> Permission {
    Permission::new(scopes::METADATA, name)
}

/// Register the built-in scopes, classes and serializer.
///
/// # Errors
///
/// - `Configuration` or `DuplicatePermission` if any of them is already
///   registered on the builder
pub fn register(builder: &mut RegistryBuilder) -> Result<(), ResourceError> {
    builder.register_scope(scopes::RESOURCE, "Resource")?;
    for (name, label) in [
        (permissions::READ, "Read"),
        (permissions::CREATE, "Create"),
        (permissions::UPDATE, "Update"),
        (permissions::DELETE, "Delete"),
        (permissions::CHANGE_PERMISSIONS, "Change permissions"),
        (permissions::CHILDREN_MANAGE, "Manage children"),
    ] {
        builder.register_permission(PermissionTarget::Scope(scopes::RESOURCE), name, label)?;
    }

    builder.register_scope(scopes::METADATA, "Metadata")?;
    builder.register_permission(
        PermissionTarget::Scope(scopes::METADATA),
        metadata_permissions::READ,
        "Read",
    )?;
    builder.register_permission(
        PermissionTarget::Scope(scopes::METADATA),
        metadata_permissions::WRITE,
        "Write",
    )?;

    builder.register_class(
        ResourceClass::new(classes::RESOURCE)
            .label("Resource")
            .scopes([scopes::RESOURCE, scopes::METADATA]),
    )?;
    builder.register_class(
        ResourceClass::new(classes::RESOURCE_GROUP)
            .label("Resource group")
            .inherits(classes::RESOURCE)
            .scopes([scopes::RESOURCE, scopes::METADATA])
            .parent_policy(group_parent)
            .child_policy(accept_any_child),
    )?;

    builder.register_serializer(resource_serializer())
}

fn resource_serializer() -> Serializer {
    let read = || resource_permission(permissions::READ);
    let update = || resource_permission(permissions::UPDATE);

    Serializer::new(RESOURCE_SERIALIZER, classes::RESOURCE)
        .target_scope(scopes::RESOURCE)
        .attribute(Attribute::property("id").read(read()).order(0))
        .attribute(Attribute::property("cls").read(read()).order(1))
        // Gated by `resource.update` here, the setter adds `children-manage`.
        .attribute(
            Attribute::resource_relationship("parent")
                .read(read())
                .write(update())
                .setter(set_parent)
                .order(2),
        )
        .attribute(
            Attribute::relationship("owner_user")
                .read(read())
                .getter(get_owner_user)
                .order(3),
        )
        .attribute(
            Attribute::property("keyname")
                .read(read())
                .write(update())
                .order(4),
        )
        .attribute(
            Attribute::property("display_name")
                .read(read())
                .write(update())
                .order(5),
        )
        .attribute(
            Attribute::property("description")
                .read(metadata_permission(metadata_permissions::READ))
                .write(metadata_permission(metadata_permissions::WRITE))
                .order(6),
        )
        .attribute(
            Attribute::property("children")
                .read(read())
                .getter(get_children)
                .order(7),
        )
        .attribute(
            Attribute::property("scopes")
                .read(read())
                .getter(get_scopes)
                .order(8),
        )
}

/// A group is either a root or nested in another group.
fn group_parent(registry: &Registry, parent: Option<&Resource>) -> bool {
    parent.is_none_or(|p| registry.is_instance(p, classes::RESOURCE_GROUP))
}

fn accept_any_child(_: &Registry, _: &Resource, _: &Resource) -> bool {
    true
}

/// Parent reassignment runs the full reparent protocol. A resource cannot be
/// detached to the root through the payload.
///
/// The attribute's write requirement is `resource.update` on the resource
/// being moved, so a move needs it on top of `children-manage` on the new
/// parent that the protocol checks.
#[allow(clippy::needless_pass_by_value)]
fn set_parent(
    pass: &mut Pass<'_>,
    resource: &mut Resource,
    name: &str,
    value: Value,
) -> Result<(), ResourceError> {
    let target = reference_id(name, &value)?;
    if target == resource.parent_id {
        return Ok(());
    }
    let Some(parent_id) = target else {
        return Err(ResourceError::Structural(format!(
            "resource {} cannot be detached to the root",
            resource.id
        )));
    };

    let service = pass.service();
    let new_parent = service.get(parent_id)?;
    service.check_reparent(resource, &new_parent, pass.user())?;
    resource.parent_id = Some(new_parent.id);
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn get_owner_user(_: &Pass<'_>, resource: &Resource, _: &str) -> Result<Value, ResourceError> {
    Ok(json!({ "id": resource.owner_user }))
}

fn get_children(pass: &Pass<'_>, resource: &Resource, _: &str) -> Result<Value, ResourceError> {
    let children = pass.service().store().children(resource.id)?;
    Ok(Value::Bool(!children.is_empty()))
}

fn get_scopes(pass: &Pass<'_>, resource: &Resource, _: &str) -> Result<Value, ResourceError> {
    let class = pass.service().registry().class(&resource.cls)?;
    Ok(Value::from(class.scope_ids().to_vec()))
}
