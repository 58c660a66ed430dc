//! Configuration for the static principal plugin.

use serde::Deserialize;
use uuid::Uuid;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticPrincipalPluginConfig {
    /// Known users.
    pub users: Vec<UserConfig>,

    /// Groups and their members. Every member must be listed in `users`.
    pub groups: Vec<GroupConfig>,
}

/// A user entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserConfig {
    pub id: Uuid,
    pub keyname: String,
}

/// A group entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
    pub id: Uuid,
    pub keyname: String,
    #[serde(default)]
    pub members: Vec<Uuid>,
}
