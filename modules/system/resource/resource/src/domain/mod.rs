//! Domain layer: the resource service and ACL resolution.

mod acl;
mod service;

pub use service::ResourceService;
