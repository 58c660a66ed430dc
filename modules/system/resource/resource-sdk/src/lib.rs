#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Resource SDK
//!
//! This crate provides the public contract of the `resource` module:
//!
//! - [`Resource`], [`NewResource`], [`ResourceId`] - Tree node models
//! - [`AclRule`], [`AclAction`], [`Principal`] - Access control rules
//! - [`Permission`], [`PermissionSets`] - Resolution results
//! - [`ResourceError`] - Error taxonomy shared by the engine and collaborators
//! - [`ResourceStore`], [`PrincipalDirectory`] - Collaborator traits
//!
//! ## Usage
//!
//! ```ignore
//! use resource_sdk::{AclRule, Principal};
//!
//! // Let the editors group update every document below this node.
//! let rule = AclRule::allow(Principal::Group(editors))
//!     .for_identity("document")
//!     .on_permission("resource", "update");
//! ```

pub mod api;
pub mod error;
pub mod models;

pub use api::{PrincipalDirectory, ResourceStore};
pub use error::ResourceError;
pub use models::{
    AclAction, AclRule, GroupId, NewResource, Payload, Permission, PermissionSets, Principal,
    Resource, ResourceId, UserId,
};
