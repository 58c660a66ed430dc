//! Service implementation for the static principal plugin.

use std::collections::{HashMap, HashSet};

use anyhow::bail;
use resource_sdk::{GroupId, PrincipalDirectory, UserId};
use tracing::info;

use crate::config::StaticPrincipalPluginConfig;

/// Static principal directory.
///
/// Users and group memberships come from configuration and never change
/// afterwards.
#[derive(Debug)]
pub struct Service {
    users: HashMap<String, UserId>,
    groups: HashMap<String, GroupId>,
    members: HashMap<GroupId, HashSet<UserId>>,
}

impl Service {
    /// Create a service from plugin configuration.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids or keynames and on group members that are not
    /// configured users.
    pub fn from_config(cfg: &StaticPrincipalPluginConfig) -> anyhow::Result<Self> {
        let mut users = HashMap::with_capacity(cfg.users.len());
        let mut user_ids = HashSet::with_capacity(cfg.users.len());
        for user in &cfg.users {
            if !user_ids.insert(user.id) {
                bail!("duplicate user id {}", user.id);
            }
            if users.insert(user.keyname.clone(), user.id).is_some() {
                bail!("duplicate user keyname '{}'", user.keyname);
            }
        }

        let mut groups = HashMap::with_capacity(cfg.groups.len());
        let mut members = HashMap::with_capacity(cfg.groups.len());
        for group in &cfg.groups {
            if groups.insert(group.keyname.clone(), group.id).is_some() {
                bail!("duplicate group keyname '{}'", group.keyname);
            }
            if let Some(unknown) = group.members.iter().find(|m| !user_ids.contains(*m)) {
                bail!("group '{}' lists unknown user {unknown}", group.keyname);
            }
            if members
                .insert(group.id, group.members.iter().copied().collect())
                .is_some()
            {
                bail!("duplicate group id {}", group.id);
            }
        }

        info!(
            users = users.len(),
            groups = groups.len(),
            "Static principal directory loaded"
        );
        Ok(Self {
            users,
            groups,
            members,
        })
    }

    #[must_use]
    pub fn user(&self, keyname: &str) -> Option<UserId> {
        self.users.get(keyname).copied()
    }

    #[must_use]
    pub fn group(&self, keyname: &str) -> Option<GroupId> {
        self.groups.get(keyname).copied()
    }
}

impl PrincipalDirectory for Service {
    fn is_member(&self, user: UserId, group: GroupId) -> bool {
        self.members
            .get(&group)
            .is_some_and(|members| members.contains(&user))
    }
}
