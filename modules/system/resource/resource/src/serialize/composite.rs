use resource_sdk::{Payload, Resource, ResourceError, UserId};
use serde_json::Value;
use tracing::{debug, info};

use super::{BoundSerializer, Pass};
use crate::domain::ResourceService;

/// Every applicable serializer of a resource, namespaced by identity.
///
/// Transient: built per request for one resource, one principal and an
/// optional payload.
pub struct CompositeSerializer<'a> {
    service: &'a ResourceService,
    resource: Resource,
    user: UserId,
    payload: Option<Payload>,
    members: Vec<&'a BoundSerializer>,
}

impl<'a> CompositeSerializer<'a> {
    /// Select members: serializers applicable to the resource and, when a
    /// payload is given, whose identity is a key of it.
    #[must_use]
    pub fn new(
        service: &'a ResourceService,
        resource: Resource,
        user: UserId,
        payload: Option<Payload>,
    ) -> Self {
        let registry = service.registry();
        let members = registry
            .serializers()
            .iter()
            .filter(|s| {
                payload
                    .as_ref()
                    .is_none_or(|p| p.contains_key(s.identity()))
                    && s.is_applicable(registry, &resource)
            })
            .collect();
        Self {
            service,
            resource,
            user,
            payload,
            members,
        }
    }

    /// Identities of the selected members, in registration order.
    pub fn member_identities(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|s| s.identity())
    }

    #[inline]
    #[must_use]
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    #[must_use]
    pub fn into_resource(self) -> Resource {
        self.resource
    }

    /// `{identity: {attribute: value}}` for every member.
    ///
    /// # Errors
    ///
    /// Propagates permission resolution and getter failures.
    pub fn serialize(&self) -> Result<Payload, ResourceError> {
        let pass = Pass::begin(self.service, &self.resource, self.user)?;
        let mut out = Payload::new();
        for member in &self.members {
            let section = member.serialize(&pass, &self.resource)?;
            out.insert(member.identity().to_owned(), Value::Object(section));
        }
        Ok(out)
    }

    /// Apply the payload, all or nothing.
    ///
    /// Members write into a working copy in registration order. The first
    /// failure is returned and nothing is persisted; on success the copy is
    /// stored with one update and becomes [`Self::resource`].
    ///
    /// # Errors
    ///
    /// - `InvalidValue` if a member's section is not an object
    /// - `Forbidden`, `Structural`, `NotFound` and other failures raised by
    ///   member serializers or their setters
    /// - store failures from the final update
    pub fn deserialize(&mut self) -> Result<&Resource, ResourceError> {
        let Some(payload) = self.payload.as_ref() else {
            return Ok(&self.resource);
        };

        let mut working = self.resource.clone();
        let mut pass = Pass::begin(self.service, &self.resource, self.user)?;
        for member in &self.members {
            let section = match payload.get(member.identity()) {
                Some(Value::Object(section)) => section,
                Some(_) => {
                    return Err(ResourceError::invalid_value(
                        member.identity(),
                        "expected an object",
                    ));
                }
                None => continue,
            };
            member.deserialize(&mut pass, &mut working, section)?;
        }

        if working == self.resource {
            debug!(resource_id = %self.resource.id, "Payload left the resource unchanged");
            return Ok(&self.resource);
        }

        self.service.store().update(&working)?;
        info!(resource_id = %working.id, user = %self.user, "Resource updated from payload");
        self.resource = working;
        Ok(&self.resource)
    }
}
