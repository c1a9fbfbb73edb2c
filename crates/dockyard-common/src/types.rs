//! Value types that make up a container run configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Command line for `command` or `entrypoint`.
///
/// A plain string runs through a shell, a list is executed directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arguments {
    /// Shell form, e.g. `npm start`.
    Shell(String),
    /// Exec form, e.g. `["npm", "start"]`.
    Exec(Vec<String>),
}

/// Logging driver settings for a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfiguration {
    /// Name of the logging driver, e.g. `json-file` or `syslog`.
    pub driver_name: Option<String>,
    /// Driver-specific options.
    #[serde(default)]
    pub log_opts: BTreeMap<String, String>,
}

/// Attachment of a container to a single network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network name or mode (`bridge`, `host`, `container:<name>`, a custom network).
    pub name: String,
    /// Aliases of the container inside that network.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl NetworkConfig {
    /// Creates a network attachment without aliases.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
        }
    }
}

/// A resource limit applied to the container process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UlimitConfig {
    /// Limit name, e.g. `nofile` or `nproc`.
    pub name: String,
    /// Hard limit.
    pub hard: Option<i64>,
    /// Soft limit.
    pub soft: Option<i64>,
}

/// Restart behaviour of a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// Policy name: `no`, `always`, `unless-stopped` or `on-failure`.
    pub name: String,
    /// Maximum retry count, only meaningful for `on-failure`.
    #[serde(default)]
    pub retry: u32,
}

/// Volumes mounted into a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunVolumeConfiguration {
    /// Bind mounts and named volumes in `src:dst[:mode]` form.
    #[serde(default)]
    pub bind: Vec<String>,
    /// Containers whose volumes are mounted as well.
    #[serde(default)]
    pub from: Vec<String>,
}
