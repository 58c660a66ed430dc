use std::collections::BTreeSet;

use resource_sdk::{Payload, Permission, Resource, ResourceError, UserId};
use tracing::debug;

use super::attribute::{Attribute, BoundAttribute};
use crate::config::ReadOnlyWrites;
use crate::domain::ResourceService;
use crate::registry::Registry;

/// Per-class serializer declaration.
///
/// ```ignore
/// let s = Serializer::new("document", "document")
///     .target_scope("doc")
///     .attribute(Attribute::property("title").read("view").write("edit"));
/// ```
#[derive(Debug, Clone)]
pub struct Serializer {
    identity: String,
    resclass: String,
    target_scope: Option<String>,
    attributes: Vec<Attribute>,
}

impl Serializer {
    /// `identity` is the namespace key in composite payloads; `resclass` is
    /// the class whose instances the serializer applies to.
    #[must_use]
    pub fn new(identity: impl Into<String>, resclass: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            resclass: resclass.into(),
            target_scope: None,
            attributes: Vec::new(),
        }
    }

    /// Scope that bare permission names resolve against. Defaults to the
    /// identity scope of the class.
    #[must_use]
    pub fn target_scope(mut self, scope: impl Into<String>) -> Self {
        self.target_scope = Some(scope.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[inline]
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub(crate) fn bind(self, registry: &Registry) -> Result<BoundSerializer, ResourceError> {
        registry.class(&self.resclass)?;

        let default_scope = self.target_scope.as_deref().unwrap_or(&self.resclass);
        let mut names = BTreeSet::new();
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for attribute in self.attributes {
            if !names.insert(attribute.name().to_owned()) {
                return Err(ResourceError::Configuration(format!(
                    "serializer '{}' declares attribute '{}' twice",
                    self.identity,
                    attribute.name()
                )));
            }
            attributes.push(attribute.bind(registry, default_scope)?);
        }
        // Stable: ties keep declaration order.
        attributes.sort_by_key(BoundAttribute::order);

        Ok(BoundSerializer {
            identity: self.identity,
            resclass: self.resclass,
            attributes,
        })
    }
}

/// Serializer with every attribute bound, owned by the frozen registry.
#[derive(Debug)]
pub struct BoundSerializer {
    identity: String,
    resclass: String,
    attributes: Vec<BoundAttribute>,
}

impl BoundSerializer {
    #[inline]
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[inline]
    #[must_use]
    pub fn resclass(&self) -> &str {
        &self.resclass
    }

    /// Attributes in serialization order.
    #[must_use]
    pub fn attributes(&self) -> &[BoundAttribute] {
        &self.attributes
    }

    #[must_use]
    pub fn is_applicable(&self, registry: &Registry, resource: &Resource) -> bool {
        registry.is_instance(resource, &self.resclass)
    }

    /// Readable attributes in declared order.
    ///
    /// # Errors
    ///
    /// Propagates getter failures (for instance `NotFound` for a dangling
    /// resource reference).
    pub fn serialize(
        &self,
        pass: &Pass<'_>,
        resource: &Resource,
    ) -> Result<Payload, ResourceError> {
        let mut out = Payload::new();
        for attr in &self.attributes {
            let readable = attr.read_requirement().is_some_and(|p| pass.has(p));
            if readable {
                out.insert(attr.name().to_owned(), attr.get(pass, resource)?);
            }
        }
        Ok(out)
    }

    /// Apply payload keys naming declared attributes, in declared order.
    ///
    /// Keys marked by a setter of this serializer are skipped. Marks do not
    /// carry over to the next serializer of a composite.
    ///
    /// # Errors
    ///
    /// - `Forbidden` naming the attribute when its write requirement is not
    ///   held, or when it has none and the policy is
    ///   [`ReadOnlyWrites::Reject`]
    /// - any setter failure, unchanged
    pub fn deserialize(
        &self,
        pass: &mut Pass<'_>,
        resource: &mut Resource,
        payload: &Payload,
    ) -> Result<(), ResourceError> {
        let policy = pass.service().config().read_only_writes;
        pass.handled.clear();
        for attr in &self.attributes {
            let Some(value) = payload.get(attr.name()) else {
                continue;
            };
            if pass.is_handled(attr.name()) {
                continue;
            }
            match attr.write_requirement() {
                None => {
                    if policy == ReadOnlyWrites::Reject {
                        return Err(ResourceError::forbidden_attribute(attr.name()));
                    }
                    debug!(
                        serializer = %self.identity,
                        attribute = attr.name(),
                        "Skipping read-only attribute"
                    );
                }
                Some(perm) if pass.has(perm) => {
                    attr.set(pass, resource, value.clone())?;
                }
                Some(_) => return Err(ResourceError::forbidden_attribute(attr.name())),
            }
        }
        Ok(())
    }
}

/// State of one serialization pass over one resource.
///
/// Permissions are resolved once, when the pass begins, against the
/// resource as it was before any setter ran.
pub struct Pass<'a> {
    service: &'a ResourceService,
    user: UserId,
    granted: BTreeSet<Permission>,
    handled: BTreeSet<String>,
}

impl<'a> Pass<'a> {
    /// Resolve the principal's effective permissions on `resource`.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures.
    pub fn begin(
        service: &'a ResourceService,
        resource: &Resource,
        user: UserId,
    ) -> Result<Self, ResourceError> {
        Ok(Self {
            service,
            user,
            granted: service.permissions(resource, user)?,
            handled: BTreeSet::new(),
        })
    }

    #[inline]
    #[must_use]
    pub fn service(&self) -> &'a ResourceService {
        self.service
    }

    #[inline]
    #[must_use]
    pub fn user(&self) -> UserId {
        self.user
    }

    #[must_use]
    pub fn has(&self, perm: &Permission) -> bool {
        self.granted.contains(perm)
    }

    /// Mark a sibling attribute as handled by a custom setter. The rest of
    /// the current serializer skips it.
    pub fn mark(&mut self, name: &str) {
        self.handled.insert(name.to_owned());
    }

    #[must_use]
    pub fn is_handled(&self, name: &str) -> bool {
        self.handled.contains(name)
    }
}
