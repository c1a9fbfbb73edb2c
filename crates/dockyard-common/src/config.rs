//! Image configuration model.
//!
//! An [`ImageConfiguration`] is both the caller-supplied baseline (carrying
//! the compose [`ComposeExternalConfig`] and the build/run/watch defaults)
//! and the shape of every resolved configuration the translator returns.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_COMPOSE_BASEDIR, DEFAULT_COMPOSE_FILE};
use crate::error::{DockyardError, Result};
use crate::types::{
    Arguments, LogConfiguration, NetworkConfig, RestartPolicy, RunVolumeConfiguration,
    UlimitConfig,
};

/// Configuration of a single image: how to build it and how to run it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageConfiguration {
    /// Image reference, e.g. `myapp:1.0`.
    pub name: Option<String>,
    /// Short name used to refer to the container.
    pub alias: Option<String>,
    /// Build settings, absent for images that are only pulled.
    pub build: Option<BuildImageConfiguration>,
    /// Run settings.
    pub run: Option<RunImageConfiguration>,
    /// Watch settings for rebuild-on-change workflows.
    pub watch: Option<WatchImageConfiguration>,
    /// Compose file reference, only set on an unresolved baseline.
    pub external: Option<ComposeExternalConfig>,
}

impl ImageConfiguration {
    /// Reads a baseline configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// image configuration.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| DockyardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the structural constraints of a baseline configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the external compose section names an empty
    /// compose file.
    pub fn validate(&self) -> Result<()> {
        let empty_file = self
            .external
            .as_ref()
            .is_some_and(|external| external.compose_file.trim().is_empty());
        if empty_file {
            return Err(DockyardError::Config {
                message: "external compose configuration has an empty composeFile".into(),
            });
        }
        Ok(())
    }
}

/// Where to find the compose file for an unresolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposeExternalConfig {
    /// Directory of the compose file, relative to the project root.
    pub basedir: String,
    /// Compose file name, relative to `basedir` unless absolute.
    pub compose_file: String,
}

impl Default for ComposeExternalConfig {
    fn default() -> Self {
        Self {
            basedir: DEFAULT_COMPOSE_BASEDIR.into(),
            compose_file: DEFAULT_COMPOSE_FILE.into(),
        }
    }
}

/// How an image is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildImageConfiguration {
    /// Absolute path of the Dockerfile.
    pub dockerfile: Option<PathBuf>,
    /// Build arguments passed as `--build-arg`.
    pub args: Option<BTreeMap<String, String>>,
    /// Additional tags applied after the build.
    pub tags: Vec<String>,
    /// Disable the build cache.
    pub no_cache: Option<bool>,
    /// Cleanup mode for dangling images (`try`, `remove`, `none`).
    pub cleanup: Option<String>,
}

/// How a container is started from an image.
///
/// Every field is optional so that a resolved configuration can take a
/// field from a compose service and fall back to the baseline otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunImageConfiguration {
    /// Kernel capabilities to add.
    pub cap_add: Option<Vec<String>>,
    /// Kernel capabilities to drop.
    pub cap_drop: Option<Vec<String>>,
    /// Command overriding the image's `CMD`.
    pub cmd: Option<Arguments>,
    /// Services that have to be started first.
    pub depends_on: Option<Vec<String>>,
    /// DNS servers.
    pub dns: Option<Vec<String>>,
    /// DNS search domains.
    pub dns_search: Option<Vec<String>>,
    /// Entrypoint overriding the image's `ENTRYPOINT`.
    pub entrypoint: Option<Arguments>,
    /// Environment variables.
    pub env: Option<BTreeMap<String, String>>,
    /// Additional `/etc/hosts` entries in `host:ip` form.
    pub extra_hosts: Option<Vec<String>>,
    /// Container labels.
    pub labels: Option<BTreeMap<String, String>>,
    /// Links to other containers in `name[:alias]` form.
    pub links: Option<Vec<String>>,
    /// Logging driver.
    pub log: Option<LogConfiguration>,
    /// Network attachment.
    pub network: Option<NetworkConfig>,
    /// Port mappings in `[host:]container[/proto]` form.
    pub ports: Option<Vec<String>>,
    /// Resource limits.
    pub ulimits: Option<Vec<UlimitConfig>>,
    /// Mounted volumes.
    pub volumes: Option<RunVolumeConfiguration>,
    /// NIS domain name.
    pub domainname: Option<String>,
    /// Container host name.
    pub hostname: Option<String>,
    /// Memory limit in bytes.
    pub memory: Option<i64>,
    /// Memory plus swap limit in bytes, `-1` for unlimited swap.
    pub memory_swap: Option<i64>,
    /// Run in privileged mode.
    pub privileged: Option<bool>,
    /// Restart policy.
    pub restart_policy: Option<RestartPolicy>,
    /// Size of `/dev/shm` in bytes.
    pub shm_size: Option<i64>,
    /// User the container process runs as.
    pub user: Option<String>,
    /// Working directory inside the container.
    pub working_dir: Option<String>,
    /// Pattern for naming the created container.
    pub name_pattern: Option<String>,
    /// Skip running this image.
    pub skip: Option<bool>,
}

/// Watch behaviour for an image during development.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchImageConfiguration {
    /// What to do on change: `build`, `run`, `both`, `copy` or `none`.
    pub mode: Option<String>,
    /// Polling interval in milliseconds.
    pub interval: Option<u64>,
    /// Goal executed after a rebuild.
    pub post_goal: Option<String>,
    /// Command executed inside the container after a change.
    pub post_exec: Option<String>,
}
