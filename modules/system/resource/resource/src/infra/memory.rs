//! In-memory [`ResourceStore`].

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use resource_sdk::{AclRule, NewResource, Resource, ResourceError, ResourceId, ResourceStore};
use tracing::debug;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    resources: BTreeMap<ResourceId, Resource>,
    acl: HashMap<ResourceId, Vec<AclRule>>,
}

impl Tables {
    fn ensure_parent_exists(&self, parent: Option<ResourceId>) -> Result<(), ResourceError> {
        match parent {
            Some(id) if !self.resources.contains_key(&id) => {
                Err(ResourceError::resource_not_found(id))
            }
            _ => Ok(()),
        }
    }

    fn ensure_keyname_free(
        &self,
        keyname: Option<&str>,
        owner: Option<ResourceId>,
    ) -> Result<(), ResourceError> {
        let Some(keyname) = keyname else {
            return Ok(());
        };
        let taken = self
            .resources
            .values()
            .any(|r| r.keyname.as_deref() == Some(keyname) && Some(r.id) != owner);
        if taken {
            return Err(ResourceError::Conflict(format!(
                "keyname '{keyname}' is already in use"
            )));
        }
        Ok(())
    }
}

/// Store keeping every table behind one lock; each call is atomic.
///
/// Ids are assigned incrementally. The store checks referential integrity of
/// parent ids and keyname uniqueness, but not class policies or cycles.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Store whose first assigned id is `first_id`.
    #[must_use]
    pub fn starting_at(first_id: i64) -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_id: first_id,
                ..Tables::default()
            }),
        }
    }
}

impl ResourceStore for MemoryStore {
    fn lookup(&self, id: ResourceId) -> Result<Option<Resource>, ResourceError> {
        Ok(self.tables.read().resources.get(&id).cloned())
    }

    fn children(&self, id: ResourceId) -> Result<Vec<Resource>, ResourceError> {
        let tables = self.tables.read();
        let mut children: Vec<Resource> = tables
            .resources
            .values()
            .filter(|r| r.parent_id == Some(id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    fn acl_rules(&self, id: ResourceId) -> Result<Vec<AclRule>, ResourceError> {
        Ok(self
            .tables
            .read()
            .acl
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    fn insert(&self, new: NewResource) -> Result<Resource, ResourceError> {
        let mut tables = self.tables.write();
        tables.ensure_parent_exists(new.parent_id)?;
        tables.ensure_keyname_free(new.keyname.as_deref(), None)?;

        let id = ResourceId(tables.next_id);
        tables.next_id += 1;
        let resource = new.into_resource(id);
        tables.resources.insert(id, resource.clone());
        debug!(resource_id = %id, "Stored new resource");
        Ok(resource)
    }

    fn update(&self, resource: &Resource) -> Result<(), ResourceError> {
        let mut tables = self.tables.write();
        if !tables.resources.contains_key(&resource.id) {
            return Err(ResourceError::resource_not_found(resource.id));
        }
        tables.ensure_parent_exists(resource.parent_id)?;
        tables.ensure_keyname_free(resource.keyname.as_deref(), Some(resource.id))?;
        tables.resources.insert(resource.id, resource.clone());
        Ok(())
    }

    fn replace_acl(&self, id: ResourceId, rules: Vec<AclRule>) -> Result<(), ResourceError> {
        let mut tables = self.tables.write();
        if !tables.resources.contains_key(&id) {
            return Err(ResourceError::resource_not_found(id));
        }
        tables.acl.insert(id, rules);
        Ok(())
    }

    fn delete(&self, id: ResourceId) -> Result<Vec<ResourceId>, ResourceError> {
        let mut tables = self.tables.write();
        if !tables.resources.contains_key(&id) {
            return Err(ResourceError::resource_not_found(id));
        }

        let mut removed = vec![id];
        let mut cursor = 0;
        while cursor < removed.len() {
            let current = removed[cursor];
            removed.extend(
                tables
                    .resources
                    .values()
                    .filter(|r| r.parent_id == Some(current) && !removed.contains(&r.id))
                    .map(|r| r.id)
                    .collect::<Vec<_>>(),
            );
            cursor += 1;
        }

        for rid in &removed {
            tables.resources.remove(rid);
            tables.acl.remove(rid);
        }
        debug!(resource_id = %id, removed = removed.len(), "Deleted subtree");
        Ok(removed)
    }

    fn len(&self) -> usize {
        self.tables.read().resources.len()
    }
}
