#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static principal plugin
//!
//! [`PrincipalDirectory`](resource_sdk::PrincipalDirectory) backed by users
//! and groups listed in configuration. Meant for development, tests and
//! single-node deployments without an identity provider.
//!
//! ## Usage
//!
//! ```ignore
//! let cfg: StaticPrincipalPluginConfig = serde_saphyr::from_str(yaml)?;
//! let principals = Arc::new(Service::from_config(&cfg)?);
//! ```

pub mod config;
pub mod domain;

pub use config::{GroupConfig, StaticPrincipalPluginConfig, UserConfig};
pub use domain::Service;
