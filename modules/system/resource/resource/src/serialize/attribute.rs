use resource_sdk::{Permission, Resource, ResourceError, ResourceId};
use serde_json::{Value, json};

use super::Pass;
use crate::registry::Registry;

/// Reads an attribute value out of a resource.
pub type Getter = fn(&Pass<'_>, &Resource, &str) -> Result<Value, ResourceError>;

/// Writes a payload value into a resource.
pub type Setter = fn(&mut Pass<'_>, &mut Resource, &str, Value) -> Result<(), ResourceError>;

/// Permission reference as written in an attribute declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRef {
    /// Explicit `(scope, name)`.
    Qualified { scope: String, name: String },
    /// Name resolved against the serializer's target scope, which defaults
    /// to the identity scope of its class.
    Bare(String),
}

impl PermissionRef {
    #[must_use]
    pub fn qualified(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            scope: scope.into(),
            name: name.into(),
        }
    }

    fn resolve(
        &self,
        registry: &Registry,
        default_scope: &str,
    ) -> Result<Permission, ResourceError> {
        match self {
            Self::Qualified { scope, name } => registry.permission(scope, name),
            Self::Bare(name) => registry.permission(default_scope, name),
        }
    }
}

impl From<Permission> for PermissionRef {
    fn from(perm: Permission) -> Self {
        Self::qualified(perm.scope(), perm.name())
    }
}

impl From<&str> for PermissionRef {
    fn from(name: &str) -> Self {
        Self::Bare(name.to_owned())
    }
}

/// How an attribute's value is shaped on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Raw scalar value.
    Property,
    /// Reference exposed as `{"id": ..}`.
    Relationship,
    /// Resource reference exposed as `{"id": .., "parent": {"id": ..}}`. The
    /// parent id is `null` when the target is a root.
    ResourceRelationship,
}

/// Attribute declaration, unbound until the registry is frozen.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
    read: Option<PermissionRef>,
    write: Option<PermissionRef>,
    order: i32,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl Attribute {
    fn with_kind(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            read: None,
            write: None,
            order: 0,
            getter: None,
            setter: None,
        }
    }

    #[must_use]
    pub fn property(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::Property)
    }

    #[must_use]
    pub fn relationship(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::Relationship)
    }

    #[must_use]
    pub fn resource_relationship(name: impl Into<String>) -> Self {
        Self::with_kind(name, AttributeKind::ResourceRelationship)
    }

    #[must_use]
    pub fn read(mut self, perm: impl Into<PermissionRef>) -> Self {
        self.read = Some(perm.into());
        self
    }

    #[must_use]
    pub fn write(mut self, perm: impl Into<PermissionRef>) -> Self {
        self.write = Some(perm.into());
        self
    }

    /// Position within the serializer; ties keep declaration order.
    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn getter(mut self, getter: Getter) -> Self {
        self.getter = Some(getter);
        self
    }

    #[must_use]
    pub fn setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bind(
        self,
        registry: &Registry,
        default_scope: &str,
    ) -> Result<BoundAttribute, ResourceError> {
        let read = self
            .read
            .map(|r| r.resolve(registry, default_scope))
            .transpose()?;
        let write = self
            .write
            .map(|r| r.resolve(registry, default_scope))
            .transpose()?;

        let (default_get, default_set): (Getter, Setter) = match self.kind {
            AttributeKind::Property => (get_property, set_property),
            AttributeKind::Relationship => (get_relationship, set_relationship),
            AttributeKind::ResourceRelationship => (get_resource_relationship, set_relationship),
        };

        Ok(BoundAttribute {
            name: self.name,
            kind: self.kind,
            read,
            write,
            order: self.order,
            getter: self.getter.unwrap_or(default_get),
            setter: self.setter.unwrap_or(default_set),
        })
    }
}

/// Attribute with its requirements resolved against the registry.
#[derive(Debug, Clone)]
pub struct BoundAttribute {
    name: String,
    kind: AttributeKind,
    read: Option<Permission>,
    write: Option<Permission>,
    order: i32,
    getter: Getter,
    setter: Setter,
}

impl BoundAttribute {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn read_requirement(&self) -> Option<&Permission> {
        self.read.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn write_requirement(&self) -> Option<&Permission> {
        self.write.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    pub(crate) fn get(&self, pass: &Pass<'_>, resource: &Resource) -> Result<Value, ResourceError> {
        (self.getter)(pass, resource, &self.name)
    }

    pub(crate) fn set(
        &self,
        pass: &mut Pass<'_>,
        resource: &mut Resource,
        value: Value,
    ) -> Result<(), ResourceError> {
        (self.setter)(pass, resource, &self.name, value)
    }
}

#[allow(clippy::unnecessary_wraps)]
fn get_property(_: &Pass<'_>, resource: &Resource, name: &str) -> Result<Value, ResourceError> {
    Ok(resource.field(name))
}

fn set_property(
    _: &mut Pass<'_>,
    resource: &mut Resource,
    name: &str,
    value: Value,
) -> Result<(), ResourceError> {
    resource.set_field(name, value)
}

#[allow(clippy::unnecessary_wraps)]
fn get_relationship(_: &Pass<'_>, resource: &Resource, name: &str) -> Result<Value, ResourceError> {
    Ok(resource
        .reference(name)
        .map_or(Value::Null, |id| json!({ "id": id })))
}

fn get_resource_relationship(
    pass: &Pass<'_>,
    resource: &Resource,
    name: &str,
) -> Result<Value, ResourceError> {
    let Some(id) = resource.reference(name) else {
        return Ok(Value::Null);
    };
    let target = pass.service().get(id)?;
    Ok(json!({ "id": target.id, "parent": { "id": target.parent_id } }))
}

#[allow(clippy::needless_pass_by_value)]
fn set_relationship(
    pass: &mut Pass<'_>,
    resource: &mut Resource,
    name: &str,
    value: Value,
) -> Result<(), ResourceError> {
    let target = match reference_id(name, &value)? {
        Some(id) => Some(pass.service().get(id)?.id),
        None => None,
    };
    resource.set_reference(name, target);
    Ok(())
}

/// Parse the primary-key shape `{"id": ..}` (or `null`).
///
/// # Errors
///
/// - `InvalidValue` for any other shape
pub fn reference_id(name: &str, value: &Value) -> Result<Option<ResourceId>, ResourceError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(obj) => obj
            .get("id")
            .and_then(Value::as_i64)
            .map(|id| Some(ResourceId(id)))
            .ok_or_else(|| ResourceError::invalid_value(name, "expected {\"id\": <integer>}")),
        _ => Err(ResourceError::invalid_value(
            name,
            "expected {\"id\": <integer>} or null",
        )),
    }
}
