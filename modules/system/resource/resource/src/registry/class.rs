use resource_sdk::Resource;

use super::Registry;

/// Whether a class may live under `parent` (`None` means at the root).
pub type ParentCheck = fn(&Registry, Option<&Resource>) -> bool;

/// Whether `parent` accepts `child` as a direct child.
pub type ChildCheck = fn(&Registry, &Resource, &Resource) -> bool;

fn refuse_parent(_: &Registry, _: Option<&Resource>) -> bool {
    false
}

fn refuse_child(_: &Registry, _: &Resource, _: &Resource) -> bool {
    false
}

/// Catalog entry for a resource class.
///
/// Scopes are mixed in explicitly: a class contributes exactly the scopes it
/// lists (plus its identity scope, if one is registered), never the scopes of
/// its parent class.
#[derive(Debug, Clone)]
pub struct ResourceClass {
    tag: String,
    label: String,
    parent: Option<String>,
    scopes: Vec<String>,
    check_parent: ParentCheck,
    check_child: ChildCheck,
}

impl ResourceClass {
    /// New class refusing every parent and every child.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            label: tag.clone(),
            tag,
            parent: None,
            scopes: Vec::new(),
            check_parent: refuse_parent,
            check_child: refuse_child,
        }
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn inherits(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for scope in scopes {
            let scope = scope.into();
            if !self.scopes.contains(&scope) {
                self.scopes.push(scope);
            }
        }
        self
    }

    #[must_use]
    pub fn parent_policy(mut self, check: ParentCheck) -> Self {
        self.check_parent = check;
        self
    }

    #[must_use]
    pub fn child_policy(mut self, check: ChildCheck) -> Self {
        self.check_child = check;
        self
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    #[must_use]
    pub fn display_label(&self) -> &str {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Contributed scopes, in declaration order.
    #[inline]
    #[must_use]
    pub fn scope_ids(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn check_parent(&self, registry: &Registry, parent: Option<&Resource>) -> bool {
        (self.check_parent)(registry, parent)
    }

    #[must_use]
    pub fn check_child(&self, registry: &Registry, parent: &Resource, child: &Resource) -> bool {
        (self.check_child)(registry, parent, child)
    }

    pub(super) fn push_scope(&mut self, scope: &str) {
        if !self.scopes.iter().any(|s| s == scope) {
            self.scopes.push(scope.to_owned());
        }
    }
}
