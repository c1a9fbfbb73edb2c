//! Normalization of a single compose service.
//!
//! Turns the raw key/value definition of one service into a
//! [`NormalizedService`] whose fields are either absent or in their
//! canonical shape. Keys that are not supported are dropped silently so
//! that files written for richer compose versions still translate.

use std::collections::BTreeMap;
use std::path::Path;

use dockyard_common::types::{
    Arguments, LogConfiguration, NetworkConfig, RestartPolicy, RunVolumeConfiguration,
    UlimitConfig,
};

use crate::error::{ComposeError, Result, ShapeError};
use crate::value::{Coerced, ComposeValue, Mapping};

/// Service keys that feed the normalized service.
pub const SUPPORTED_FIELDS: &[&str] = &[
    "image",
    "build",
    "command",
    "entrypoint",
    "environment",
    "cap_add",
    "cap_drop",
    "dns",
    "dns_search",
    "extra_hosts",
    "labels",
    "links",
    "external_links",
    "logging",
    "network_mode",
    "networks",
    "ports",
    "ulimits",
    "volumes",
    "volumes_from",
    "domainname",
    "hostname",
    "mem_limit",
    "memswap_limit",
    "privileged",
    "restart",
    "shm_size",
    "user",
    "working_dir",
    "depends_on",
];

/// Known compose keys that are read but never translated.
pub const IGNORED_FIELDS: &[&str] = &[
    "cgroup_parent",
    "container_name",
    "devices",
    "tmpfs",
    "env_file",
    "expose",
    "extends",
    "security_opt",
    "stop_signal",
    "cpu_share",
    "cpu_shares",
    "cpu_quota",
    "cpuset",
    "ipc",
    "mac_address",
    "read_only",
    "stdin_open",
    "tty",
];

/// Build section of a service that declares a build context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSection {
    /// Build context directory as written in the compose file.
    pub context: String,
    /// Dockerfile name relative to the context, if given.
    pub dockerfile: Option<String>,
    /// Build arguments.
    pub args: Option<BTreeMap<String, String>>,
}

/// Strongly-typed projection of a compose service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedService {
    /// Service name, used as the container alias.
    pub alias: String,
    /// Image reference.
    pub image: Option<String>,
    /// Build section, present only when a build context is declared.
    pub build: Option<BuildSection>,
    /// Command.
    pub command: Option<Arguments>,
    /// Entrypoint.
    pub entrypoint: Option<Arguments>,
    /// Environment variables.
    pub environment: Option<BTreeMap<String, String>>,
    /// Capabilities to add.
    pub cap_add: Option<Vec<String>>,
    /// Capabilities to drop.
    pub cap_drop: Option<Vec<String>>,
    /// DNS servers.
    pub dns: Option<Vec<String>>,
    /// DNS search domains.
    pub dns_search: Option<Vec<String>>,
    /// `host:ip` entries.
    pub extra_hosts: Option<Vec<String>>,
    /// Labels.
    pub labels: Option<BTreeMap<String, String>>,
    /// `links` followed by `external_links`.
    pub links: Option<Vec<String>>,
    /// Logging driver.
    pub log: Option<LogConfiguration>,
    /// Single network attachment.
    pub network: Option<NetworkConfig>,
    /// Port mappings.
    pub ports: Option<Vec<String>>,
    /// Ulimits.
    pub ulimits: Option<Vec<UlimitConfig>>,
    /// Volumes and `volumes_from`.
    pub volumes: Option<RunVolumeConfiguration>,
    /// Domain name.
    pub domainname: Option<String>,
    /// Host name.
    pub hostname: Option<String>,
    /// Memory limit in bytes.
    pub memory: Option<i64>,
    /// Memory plus swap limit in bytes.
    pub memory_swap: Option<i64>,
    /// Privileged mode.
    pub privileged: Option<bool>,
    /// Restart policy.
    pub restart_policy: Option<RestartPolicy>,
    /// `/dev/shm` size in bytes.
    pub shm_size: Option<i64>,
    /// User.
    pub user: Option<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// Startup ordering hints.
    pub depends_on: Option<Vec<String>>,
}

impl NormalizedService {
    /// Whether the service declares a build context.
    #[must_use]
    pub const fn requires_build(&self) -> bool {
        self.build.is_some()
    }
}

/// Normalizes the definition of service `name` from `compose_file`.
///
/// # Errors
///
/// Returns [`ComposeError::InvalidField`] when a supported field has a
/// shape that cannot be coerced. Unsupported fields never fail.
pub fn normalize(name: &str, compose_file: &Path, definition: &Mapping) -> Result<NormalizedService> {
    tracing::debug!(service = name, path = %compose_file.display(), "normalizing service");
    for key in definition.keys() {
        if !SUPPORTED_FIELDS.contains(&key) {
            tracing::trace!(
                service = name,
                field = key,
                known = IGNORED_FIELDS.contains(&key),
                "ignoring unsupported compose directive"
            );
        }
    }

    let fields = Fields { name, definition };
    Ok(NormalizedService {
        alias: name.to_owned(),
        image: fields.coerce("image", ComposeValue::to_text)?,
        build: fields.build()?,
        command: fields.coerce("command", ComposeValue::to_arguments)?,
        entrypoint: fields.coerce("entrypoint", ComposeValue::to_arguments)?,
        environment: fields.coerce("environment", ComposeValue::to_string_map)?,
        cap_add: fields.coerce("cap_add", ComposeValue::to_string_list)?,
        cap_drop: fields.coerce("cap_drop", ComposeValue::to_string_list)?,
        dns: fields.coerce("dns", ComposeValue::to_string_list)?,
        dns_search: fields.coerce("dns_search", ComposeValue::to_string_list)?,
        extra_hosts: fields.coerce("extra_hosts", extra_hosts)?,
        labels: fields.coerce("labels", ComposeValue::to_string_map)?,
        links: fields.links()?,
        log: fields.coerce("logging", log_configuration)?,
        network: fields.network()?,
        ports: fields.coerce("ports", ComposeValue::to_string_list)?,
        ulimits: fields.coerce("ulimits", ulimits)?,
        volumes: fields.volumes()?,
        domainname: fields.coerce("domainname", ComposeValue::to_text)?,
        hostname: fields.coerce("hostname", ComposeValue::to_text)?,
        memory: fields.coerce("mem_limit", ComposeValue::to_byte_size)?,
        memory_swap: fields.coerce("memswap_limit", ComposeValue::to_byte_size)?,
        privileged: fields.coerce("privileged", ComposeValue::to_bool)?,
        restart_policy: fields.coerce("restart", restart_policy)?,
        shm_size: fields.coerce("shm_size", ComposeValue::to_byte_size)?,
        user: fields.coerce("user", ComposeValue::to_text)?,
        working_dir: fields.coerce("working_dir", ComposeValue::to_text)?,
        depends_on: fields.coerce("depends_on", depends_on)?,
    })
}

struct Fields<'a> {
    name: &'a str,
    definition: &'a Mapping,
}

impl Fields<'_> {
    /// A present, non-null field.
    fn get(&self, key: &str) -> Option<&ComposeValue> {
        self.definition.get(key).filter(|value| !value.is_null())
    }

    fn invalid(&self, field: &str, source: ShapeError) -> ComposeError {
        ComposeError::InvalidField {
            service: self.name.to_owned(),
            field: field.to_owned(),
            source,
        }
    }

    fn coerce<T>(&self, key: &str, shape: impl FnOnce(&ComposeValue) -> Coerced<T>) -> Result<Option<T>> {
        self.get(key)
            .map(|value| shape(value).map_err(|message| self.invalid(key, message)))
            .transpose()
    }

    fn build(&self) -> Result<Option<BuildSection>> {
        let Some(value) = self.get("build") else {
            return Ok(None);
        };
        let section = match value {
            ComposeValue::Mapping(section) => section,
            ComposeValue::Sequence(_) => {
                return Err(self.invalid("build", value.unexpected("a context path or a mapping")));
            }
            scalar => {
                let context = scalar.to_text().map_err(|m| self.invalid("build", m))?;
                return Ok(Some(BuildSection {
                    context,
                    dockerfile: None,
                    args: None,
                }));
            }
        };
        let nested = |key: &str| section.get(key).filter(|value| !value.is_null());
        let Some(context) = nested("context") else {
            return Ok(None);
        };
        let context = context
            .to_text()
            .map_err(|m| self.invalid("build.context", m))?;
        let dockerfile = nested("dockerfile")
            .map(ComposeValue::to_text)
            .transpose()
            .map_err(|m| self.invalid("build.dockerfile", m))?;
        let args = nested("args")
            .map(ComposeValue::to_string_map)
            .transpose()
            .map_err(|m| self.invalid("build.args", m))?;
        Ok(Some(BuildSection {
            context,
            dockerfile,
            args,
        }))
    }

    fn links(&self) -> Result<Option<Vec<String>>> {
        let links = self.coerce("links", ComposeValue::to_string_list)?;
        let external = self.coerce("external_links", ComposeValue::to_string_list)?;
        Ok(match (links, external) {
            (None, None) => None,
            (links, external) => Some(
                links
                    .into_iter()
                    .flatten()
                    .chain(external.into_iter().flatten())
                    .collect(),
            ),
        })
    }

    fn network(&self) -> Result<Option<NetworkConfig>> {
        if let Some(mode) = self.coerce("network_mode", ComposeValue::to_text)? {
            return Ok(Some(NetworkConfig::new(mode)));
        }
        self.coerce("networks", single_network).map(Option::flatten)
    }

    fn volumes(&self) -> Result<Option<RunVolumeConfiguration>> {
        let bind = self.coerce("volumes", ComposeValue::to_string_list)?;
        let from = self.coerce("volumes_from", ComposeValue::to_string_list)?;
        if bind.is_none() && from.is_none() {
            return Ok(None);
        }
        Ok(Some(RunVolumeConfiguration {
            bind: bind.unwrap_or_default(),
            from: from.unwrap_or_default(),
        }))
    }
}

fn extra_hosts(value: &ComposeValue) -> Coerced<Vec<String>> {
    match value {
        ComposeValue::Mapping(hosts) => hosts
            .iter()
            .map(|(host, ip)| -> Coerced<String> {
                let ip = ip.to_text().map_err(|e| e.at(host))?;
                Ok(format!("{host}:{ip}"))
            })
            .collect(),
        other => other.to_string_list(),
    }
}

fn log_configuration(value: &ComposeValue) -> Coerced<LogConfiguration> {
    let logging = value.expect_mapping("a mapping")?;
    let driver_name = logging
        .get("driver")
        .filter(|v| !v.is_null())
        .map(ComposeValue::to_text)
        .transpose()
        .map_err(|e| e.at("driver"))?;
    let log_opts = logging
        .get("options")
        .map(ComposeValue::to_string_map)
        .transpose()
        .map_err(|e| e.at("options"))?
        .unwrap_or_default();
    Ok(LogConfiguration {
        driver_name,
        log_opts,
    })
}

fn single_network(value: &ComposeValue) -> Coerced<Option<NetworkConfig>> {
    match value {
        ComposeValue::Sequence(_) => {
            let names = value.to_string_list()?;
            match names.as_slice() {
                [] => Ok(None),
                [name] => Ok(Some(NetworkConfig::new(name.as_str()))),
                _ => Err(ShapeError::TooManyNetworks { count: names.len() }),
            }
        }
        ComposeValue::Mapping(networks) => {
            if networks.len() > 1 {
                return Err(ShapeError::TooManyNetworks {
                    count: networks.len(),
                });
            }
            let Some((name, settings)) = networks.iter().next() else {
                return Ok(None);
            };
            let aliases = match settings {
                ComposeValue::Null => Vec::new(),
                ComposeValue::Mapping(settings) => settings
                    .get("aliases")
                    .map(ComposeValue::to_string_list)
                    .transpose()
                    .map_err(|e| e.at(format!("{name}.aliases")))?
                    .unwrap_or_default(),
                other => return Err(other.unexpected("a mapping").at(name)),
            };
            Ok(Some(NetworkConfig {
                name: name.to_owned(),
                aliases,
            }))
        }
        scalar => scalar.to_text().map(|name| Some(NetworkConfig::new(name))),
    }
}

fn ulimits(value: &ComposeValue) -> Coerced<Vec<UlimitConfig>> {
    value
        .expect_mapping("a mapping")?
        .iter()
        .map(|(name, limit)| ulimit(name, limit))
        .collect()
}

fn ulimit(name: &str, limit: &ComposeValue) -> Coerced<UlimitConfig> {
    let (hard, soft) = match limit {
        ComposeValue::Mapping(bounds) => {
            let bound = |key: &str| {
                bounds
                    .get(key)
                    .map(ComposeValue::to_integer)
                    .transpose()
                    .map_err(|e| e.at(format!("{name}.{key}")))
            };
            (bound("hard")?, bound("soft")?)
        }
        single => {
            let n = single.to_integer().map_err(|e| e.at(name))?;
            (Some(n), Some(n))
        }
    };
    Ok(UlimitConfig {
        name: name.to_owned(),
        hard,
        soft,
    })
}

fn restart_policy(value: &ComposeValue) -> Coerced<RestartPolicy> {
    let text = value.to_text()?;
    let (name, retry) = match text.trim().split_once(':') {
        Some((name, count)) => (name, Some(count)),
        None => (text.trim(), None),
    };
    match (name, retry) {
        ("no" | "always" | "unless-stopped", None) => Ok(RestartPolicy {
            name: name.to_owned(),
            retry: 0,
        }),
        ("on-failure", retry) => {
            let retry = retry
                .map(|count| {
                    count.trim().parse::<u32>().map_err(|_| ShapeError::Text {
                        expected: "on-failure[:retries]",
                        raw: text.clone(),
                    })
                })
                .transpose()?
                .unwrap_or(0);
            Ok(RestartPolicy {
                name: name.to_owned(),
                retry,
            })
        }
        _ => Err(ShapeError::UnknownRestartPolicy { raw: text.clone() }),
    }
}

fn depends_on(value: &ComposeValue) -> Coerced<Vec<String>> {
    match value {
        ComposeValue::Mapping(services) => Ok(services.keys().map(str::to_owned).collect()),
        other => other.to_string_list(),
    }
}
