#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Resource module
//!
//! Hierarchical resource tree with declarative, per-attribute access control:
//!
//! - [`registry`] - Scope/permission registry and resource class catalog,
//!   frozen once at startup into an immutable [`Registry`]
//! - [`domain`] - [`ResourceService`]: ACL resolution and guarded tree
//!   operations over a [`ResourceStore`](resource_sdk::ResourceStore)
//! - [`serialize`] - Permission-gated serializers and the
//!   [`CompositeSerializer`]
//! - [`builtin`] - Built-in scopes, classes and the `resource` serializer
//! - [`infra`] - In-memory store
//!
//! ## Usage
//!
//! ```ignore
//! let mut builder = RegistryBuilder::new();
//! builtin::register(&mut builder)?;
//! let registry = Arc::new(builder.build()?);
//!
//! let svc = ResourceService::new(registry, store, principals, ResourceConfig::default());
//! let payload = svc.serializer(resource, user, None).serialize()?;
//! ```

pub mod builtin;
pub mod config;
pub mod domain;
pub mod infra;
pub mod registry;
pub mod serialize;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ReadOnlyWrites, ResourceConfig};
pub use domain::ResourceService;
pub use infra::MemoryStore;
pub use registry::{PermissionTarget, Registry, RegistryBuilder, Requirement, ResourceClass, Scope};
pub use serialize::{Attribute, CompositeSerializer, Pass, PermissionRef, Serializer};
