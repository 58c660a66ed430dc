//! Configuration for the resource module.

use serde::Deserialize;

/// Module configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResourceConfig {
    /// Upper bound on ancestor walks and requirement recursion. The number of
    /// stored resources caps the ancestor walk further.
    pub max_depth: usize,

    /// Also ask the new parent's class whether it accepts the child when a
    /// resource is attached or moved.
    pub enforce_check_child: bool,

    /// Treatment of payload keys naming attributes without a write requirement.
    pub read_only_writes: ReadOnlyWrites,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            enforce_check_child: true,
            read_only_writes: ReadOnlyWrites::Ignore,
        }
    }
}

/// Read-only attribute write policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReadOnlyWrites {
    /// Skip the key silently.
    #[default]
    Ignore,
    /// Fail the pass with `Forbidden` naming the attribute.
    Reject,
}
