//! Permission-gated serialization.
//!
//! A [`Serializer`] declares the attributes of one resource class together
//! with the permissions needed to read and to write each of them. Serializers
//! are bound when the registry is frozen; unknown permissions fail there, not
//! at request time. The [`CompositeSerializer`] runs every applicable bound
//! serializer of a resource under its identity key.

pub mod attribute;
pub mod composite;
pub mod serializer;

pub use attribute::{
    Attribute, AttributeKind, BoundAttribute, Getter, PermissionRef, Setter, reference_id,
};
pub use composite::CompositeSerializer;
pub use serializer::{BoundSerializer, Pass, Serializer};
