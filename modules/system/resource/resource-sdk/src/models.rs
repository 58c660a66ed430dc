//! Domain models for the resource module.
//!
//! Resources form a forest addressed by [`ResourceId`]. Each resource owns a
//! list of [`AclRule`]s; the engine combines the rules found on the path from
//! the root down to a resource into a [`PermissionSets`] result.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ResourceError;

/// User identifier.
pub type UserId = Uuid;

/// Group identifier.
pub type GroupId = Uuid;

/// Ordered attribute payload exchanged with serializers.
pub type Payload = serde_json::Map<String, Value>;

/// Stable resource identifier assigned by the store on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub i64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ResourceId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Subject of an ACL rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Principal {
    /// Matches exactly this user.
    User(UserId),
    /// Matches every member of this group.
    Group(GroupId),
}

/// What a matching rule does to a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclAction {
    #[default]
    Allow,
    Deny,
}

/// Atomic right within a scope, identified by `(scope, name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Permission {
    scope: String,
    name: String,
}

impl Permission {
    #[must_use]
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.name)
    }
}

fn default_propagate() -> bool {
    true
}

/// Allow/deny statement attached to a single resource.
///
/// Empty filters are wildcards: an empty `identity` matches every resource
/// class, an empty `scope` matches every scope and an empty `permission`
/// matches every permission of the selected scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AclRule {
    pub principal: Principal,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub permission: String,
    #[serde(default = "default_propagate")]
    pub propagate: bool,
    #[serde(default)]
    pub action: AclAction,
}

impl AclRule {
    /// Propagating wildcard rule with the given action.
    #[must_use]
    pub fn new(principal: Principal, action: AclAction) -> Self {
        Self {
            principal,
            identity: String::new(),
            scope: String::new(),
            permission: String::new(),
            propagate: true,
            action,
        }
    }

    #[must_use]
    pub fn allow(principal: Principal) -> Self {
        Self::new(principal, AclAction::Allow)
    }

    #[must_use]
    pub fn deny(principal: Principal) -> Self {
        Self::new(principal, AclAction::Deny)
    }

    /// Restrict the rule to resources of the given class tag.
    #[must_use]
    pub fn for_identity(mut self, class_tag: impl Into<String>) -> Self {
        self.identity = class_tag.into();
        self
    }

    /// Restrict the rule to every permission of a scope.
    #[must_use]
    pub fn on_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self.permission = String::new();
        self
    }

    /// Restrict the rule to a single permission.
    #[must_use]
    pub fn on_permission(mut self, scope: impl Into<String>, name: impl Into<String>) -> Self {
        self.scope = scope.into();
        self.permission = name.into();
        self
    }

    #[must_use]
    pub fn propagating(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }

    /// Whether the identity filter admits the given class tag.
    #[must_use]
    pub fn matches_identity(&self, class_tag: &str) -> bool {
        self.identity.is_empty() || self.identity == class_tag
    }

    /// Whether the scope/permission filter admits `perm`.
    ///
    /// A rule naming a permission without a scope matches nothing.
    #[must_use]
    pub fn matches_permission(&self, perm: &Permission) -> bool {
        match (self.scope.as_str(), self.permission.as_str()) {
            ("", "") => true,
            (scope, "") => scope == perm.scope(),
            (scope, name) => scope == perm.scope() && name == perm.name(),
        }
    }
}

/// Result of a resolution: rules that allowed, rules that denied, and
/// permissions withheld by unmet requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSets {
    pub allow: BTreeSet<Permission>,
    pub deny: BTreeSet<Permission>,
    pub mask: BTreeSet<Permission>,
}

impl PermissionSets {
    /// `allow - deny - mask`.
    #[must_use]
    pub fn effective(&self) -> BTreeSet<Permission> {
        self.allow
            .iter()
            .filter(|p| !self.deny.contains(*p) && !self.mask.contains(*p))
            .cloned()
            .collect()
    }
}

/// Persisted tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub parent_id: Option<ResourceId>,
    /// Class tag.
    pub cls: String,
    pub owner_user: UserId,
    pub keyname: Option<String>,
    pub display_name: String,
    pub description: Option<String>,
    /// Class-specific attributes. Resource references are stored as ids.
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Resource {
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Resource referenced by a relationship attribute.
    ///
    /// `parent` maps to `parent_id`; any other name is read from the
    /// attribute table.
    #[must_use]
    pub fn reference(&self, attr: &str) -> Option<ResourceId> {
        if attr == "parent" {
            return self.parent_id;
        }
        self.attributes
            .get(attr)
            .and_then(Value::as_i64)
            .map(ResourceId)
    }

    pub fn set_reference(&mut self, attr: &str, target: Option<ResourceId>) {
        if attr == "parent" {
            self.parent_id = target;
            return;
        }
        match target {
            Some(id) => {
                self.attributes.insert(attr.to_owned(), Value::from(id.0));
            }
            None => {
                self.attributes.remove(attr);
            }
        }
    }

    /// Raw value of a scalar field. Unknown attributes read as `null`.
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        match name {
            "id" => Value::from(self.id.0),
            "cls" => Value::from(self.cls.clone()),
            "keyname" => self.keyname.clone().map_or(Value::Null, Value::from),
            "display_name" => Value::from(self.display_name.clone()),
            "description" => self.description.clone().map_or(Value::Null, Value::from),
            other => self.attributes.get(other).cloned().unwrap_or(Value::Null),
        }
    }

    /// Assign a scalar field. `null` clears an extra attribute.
    ///
    /// # Errors
    ///
    /// - `InvalidValue` if the field is structural (`id`, `cls`, `parent`,
    ///   `owner_user`) or the value has the wrong type
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), ResourceError> {
        match name {
            "id" | "cls" | "parent" | "owner_user" => Err(ResourceError::invalid_value(
                name,
                "structural field cannot be assigned",
            )),
            "keyname" => {
                self.keyname = optional_string(name, value)?;
                Ok(())
            }
            "description" => {
                self.description = optional_string(name, value)?;
                Ok(())
            }
            "display_name" => match value {
                Value::String(s) if !s.is_empty() => {
                    self.display_name = s;
                    Ok(())
                }
                _ => Err(ResourceError::invalid_value(
                    name,
                    "expected a non-empty string",
                )),
            },
            other => {
                if value.is_object() {
                    return Err(ResourceError::invalid_value(
                        other,
                        "nested objects are not scalar attributes",
                    ));
                }
                if value.is_null() {
                    self.attributes.remove(other);
                } else {
                    self.attributes.insert(other.to_owned(), value);
                }
                Ok(())
            }
        }
    }
}

fn optional_string(name: &str, value: Value) -> Result<Option<String>, ResourceError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(ResourceError::invalid_value(name, "expected a string or null")),
    }
}

/// Resource about to be persisted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResource {
    pub parent_id: Option<ResourceId>,
    pub cls: String,
    pub owner_user: UserId,
    pub keyname: Option<String>,
    pub display_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl NewResource {
    #[must_use]
    pub fn new(
        cls: impl Into<String>,
        owner_user: UserId,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            parent_id: None,
            cls: cls.into(),
            owner_user,
            keyname: None,
            display_name: display_name.into(),
            description: None,
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn parent(mut self, parent_id: ResourceId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn keyname(mut self, keyname: impl Into<String>) -> Self {
        self.keyname = Some(keyname.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Materialize with the id chosen by the store.
    #[must_use]
    pub fn into_resource(self, id: ResourceId) -> Resource {
        Resource {
            id,
            parent_id: self.parent_id,
            cls: self.cls,
            owner_user: self.owner_user,
            keyname: self.keyname,
            display_name: self.display_name,
            description: self.description,
            attributes: self.attributes,
        }
    }
}
