use std::collections::BTreeMap;

use resource_sdk::Permission;

/// Named bundle of permissions.
#[derive(Debug, Clone)]
pub struct Scope {
    id: String,
    label: String,
    permissions: BTreeMap<String, String>,
    requirements: Vec<Requirement>,
}

impl Scope {
    pub(super) fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            permissions: BTreeMap::new(),
            requirements: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Permission by name.
    #[must_use]
    pub fn permission(&self, name: &str) -> Option<Permission> {
        self.permissions
            .contains_key(name)
            .then(|| Permission::new(self.id.as_str(), name))
    }

    /// Human label of a permission.
    #[must_use]
    pub fn permission_label(&self, name: &str) -> Option<&str> {
        self.permissions.get(name).map(String::as_str)
    }

    /// All permissions of the scope, ordered by name.
    pub fn permissions(&self) -> impl Iterator<Item = Permission> + '_ {
        self.permissions
            .keys()
            .map(|name| Permission::new(self.id.as_str(), name.as_str()))
    }

    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Returns `false` if the name was already present.
    pub(super) fn insert_permission(&mut self, name: String, label: String) -> bool {
        if self.permissions.contains_key(&name) {
            return false;
        }
        self.permissions.insert(name, label);
        true
    }

    pub(super) fn push_requirement(&mut self, requirement: Requirement) {
        self.requirements.push(requirement);
    }
}

/// Dependency between two permissions.
///
/// `dst` is withheld (masked) unless `src` holds. Without `attr`, `src` is
/// checked against the allow/deny sets of the same resource; with `attr`,
/// `src` must be effective on the resource referenced by that attribute.
/// `cls` limits the requirement to instances of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub src: Permission,
    pub dst: Permission,
    pub cls: Option<String>,
    pub attr: Option<String>,
}

impl Requirement {
    #[must_use]
    pub fn new(dst: Permission, src: Permission) -> Self {
        Self {
            src,
            dst,
            cls: None,
            attr: None,
        }
    }

    #[must_use]
    pub fn for_class(mut self, cls: impl Into<String>) -> Self {
        self.cls = Some(cls.into());
        self
    }

    #[must_use]
    pub fn on_attribute(mut self, attr: impl Into<String>) -> Self {
        self.attr = Some(attr.into());
        self
    }
}
