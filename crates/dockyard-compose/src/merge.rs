//! Merging a normalized service into the baseline configuration.
//!
//! Every field a service specifies overrides the baseline, every other
//! field keeps the baseline's value. The baseline is only borrowed.

use std::path::Path;

use dockyard_common::config::{BuildImageConfiguration, ImageConfiguration, RunImageConfiguration};

use crate::path::resolve_dockerfile;
use crate::service::NormalizedService;

/// Produces the resolved configuration of one service.
///
/// `compose_parent` is the directory holding the compose file and anchors
/// relative build contexts.
#[must_use]
pub fn resolve_image(
    service: &NormalizedService,
    compose_parent: &Path,
    baseline: &ImageConfiguration,
) -> ImageConfiguration {
    ImageConfiguration {
        name: service.image.clone(),
        alias: Some(service.alias.clone()),
        build: build_configuration(service, compose_parent, baseline.build.as_ref()),
        run: Some(run_configuration(service, baseline.run.as_ref())),
        watch: baseline.watch.clone(),
        external: None,
    }
}

/// Build configuration of a service.
///
/// Without a build context the baseline is reused as is. Otherwise only the
/// Dockerfile path and the build arguments are replaced.
#[must_use]
pub fn build_configuration(
    service: &NormalizedService,
    compose_parent: &Path,
    baseline: Option<&BuildImageConfiguration>,
) -> Option<BuildImageConfiguration> {
    if !service.requires_build() {
        return baseline.cloned();
    }
    let base = baseline.cloned().unwrap_or_default();
    let build = service.build.as_ref();
    Some(BuildImageConfiguration {
        dockerfile: build.map(|build| {
            resolve_dockerfile(&build.context, build.dockerfile.as_deref(), compose_parent)
        }),
        args: build.and_then(|build| build.args.clone()).or(base.args),
        ..base
    })
}

/// Run configuration of a service, overriding the baseline field by field.
#[must_use]
pub fn run_configuration(
    service: &NormalizedService,
    baseline: Option<&RunImageConfiguration>,
) -> RunImageConfiguration {
    let base = baseline.cloned().unwrap_or_default();
    let s = service.clone();
    RunImageConfiguration {
        cap_add: s.cap_add.or(base.cap_add),
        cap_drop: s.cap_drop.or(base.cap_drop),
        cmd: s.command.or(base.cmd),
        depends_on: s.depends_on.or(base.depends_on),
        dns: s.dns.or(base.dns),
        dns_search: s.dns_search.or(base.dns_search),
        entrypoint: s.entrypoint.or(base.entrypoint),
        env: s.environment.or(base.env),
        extra_hosts: s.extra_hosts.or(base.extra_hosts),
        labels: s.labels.or(base.labels),
        links: s.links.or(base.links),
        log: s.log.or(base.log),
        network: s.network.or(base.network),
        ports: s.ports.or(base.ports),
        ulimits: s.ulimits.or(base.ulimits),
        volumes: s.volumes.or(base.volumes),
        domainname: s.domainname.or(base.domainname),
        hostname: s.hostname.or(base.hostname),
        memory: s.memory.or(base.memory),
        memory_swap: s.memory_swap.or(base.memory_swap),
        privileged: s.privileged.or(base.privileged),
        restart_policy: s.restart_policy.or(base.restart_policy),
        shm_size: s.shm_size.or(base.shm_size),
        user: s.user.or(base.user),
        working_dir: s.working_dir.or(base.working_dir),
        name_pattern: base.name_pattern,
        skip: base.skip,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use dockyard_common::config::WatchImageConfiguration;
    use dockyard_common::types::RestartPolicy;

    use super::*;
    use crate::service::BuildSection;

    fn baseline() -> ImageConfiguration {
        ImageConfiguration {
            name: Some("baseline:latest".into()),
            alias: Some("baseline".into()),
            build: Some(BuildImageConfiguration {
                dockerfile: Some(PathBuf::from("/base/Dockerfile")),
                args: Some(BTreeMap::from([("BASE".to_string(), "1".to_string())])),
                tags: vec!["latest".into(), "stable".into()],
                no_cache: Some(true),
                cleanup: Some("remove".into()),
            }),
            run: Some(RunImageConfiguration {
                restart_policy: Some(RestartPolicy {
                    name: "always".into(),
                    retry: 0,
                }),
                ports: Some(vec!["1:1".into()]),
                name_pattern: Some("%a-%i".into()),
                skip: Some(false),
                ..RunImageConfiguration::default()
            }),
            watch: Some(WatchImageConfiguration {
                mode: Some("both".into()),
                interval: Some(500),
                ..WatchImageConfiguration::default()
            }),
            external: None,
        }
    }

    fn service() -> NormalizedService {
        NormalizedService {
            alias: "web".into(),
            image: Some("myapp:1.0".into()),
            ..NormalizedService::default()
        }
    }

    #[test]
    fn build_is_reused_without_context() {
        let base = baseline();
        let build = build_configuration(&service(), Path::new("/proj"), base.build.as_ref());
        assert_eq!(build, base.build);
    }

    #[test]
    fn build_stays_absent_without_context_or_baseline() {
        assert_eq!(build_configuration(&service(), Path::new("/proj"), None), None);
    }

    #[test]
    fn build_overrides_only_dockerfile_and_args() {
        let base = baseline();
        let svc = NormalizedService {
            build: Some(BuildSection {
                context: "./app".into(),
                dockerfile: Some("Dockerfile.dev".into()),
                args: Some(BTreeMap::from([("VERSION".to_string(), "2".to_string())])),
            }),
            ..service()
        };
        let build = build_configuration(&svc, Path::new("/proj"), base.build.as_ref())
            .expect("build configuration");
        assert_eq!(build.dockerfile, Some(PathBuf::from("/proj/app/Dockerfile.dev")));
        assert_eq!(
            build.args,
            Some(BTreeMap::from([("VERSION".to_string(), "2".to_string())]))
        );
        assert_eq!(build.tags, vec!["latest".to_string(), "stable".to_string()]);
        assert_eq!(build.no_cache, Some(true));
        assert_eq!(build.cleanup.as_deref(), Some("remove"));
    }

    #[test]
    fn build_keeps_baseline_args_when_service_has_none() {
        let base = baseline();
        let svc = NormalizedService {
            build: Some(BuildSection {
                context: "app".into(),
                dockerfile: None,
                args: None,
            }),
            ..service()
        };
        let build = build_configuration(&svc, Path::new("/proj"), base.build.as_ref())
            .expect("build configuration");
        assert_eq!(build.dockerfile, Some(PathBuf::from("/proj/app/Dockerfile")));
        assert_eq!(build.args, base.build.and_then(|b| b.args));
    }

    #[test]
    fn build_is_synthesized_without_baseline() {
        let svc = NormalizedService {
            build: Some(BuildSection {
                context: "/ctx".into(),
                dockerfile: None,
                args: None,
            }),
            ..service()
        };
        let build = build_configuration(&svc, Path::new("/proj"), None).expect("build");
        assert_eq!(build.dockerfile, Some(PathBuf::from("/ctx/Dockerfile")));
        assert!(build.tags.is_empty());
    }

    #[test]
    fn run_overrides_present_fields_only() {
        let base = baseline();
        let svc = NormalizedService {
            ports: Some(vec!["8080:80".into()]),
            environment: Some(BTreeMap::from([("FOO".to_string(), "bar".to_string())])),
            ..service()
        };
        let run = run_configuration(&svc, base.run.as_ref());
        assert_eq!(run.ports, Some(vec!["8080:80".to_string()]));
        assert_eq!(run.env.and_then(|e| e.get("FOO").cloned()).as_deref(), Some("bar"));
        assert_eq!(run.restart_policy.map(|p| p.name).as_deref(), Some("always"));
        assert_eq!(run.name_pattern.as_deref(), Some("%a-%i"));
        assert_eq!(run.skip, Some(false));
    }

    #[test]
    fn run_defaults_without_baseline() {
        let run = run_configuration(&service(), None);
        assert_eq!(run, RunImageConfiguration::default());
    }

    #[test]
    fn resolve_image_copies_watch_and_sets_identity() {
        let base = baseline();
        let resolved = resolve_image(&service(), Path::new("/proj"), &base);
        assert_eq!(resolved.name.as_deref(), Some("myapp:1.0"));
        assert_eq!(resolved.alias.as_deref(), Some("web"));
        assert_eq!(resolved.watch, base.watch);
        assert_eq!(resolved.build, base.build);
        assert_eq!(resolved.external, None);
    }

    #[test]
    fn resolve_image_leaves_baseline_untouched() {
        let base = baseline();
        let before = base.clone();
        let svc = NormalizedService {
            restart_policy: Some(RestartPolicy {
                name: "no".into(),
                retry: 0,
            }),
            ..service()
        };
        let resolved = resolve_image(&svc, Path::new("/proj"), &base);
        assert_eq!(base, before);
        assert_eq!(
            resolved.run.and_then(|r| r.restart_policy).map(|p| p.name).as_deref(),
            Some("no")
        );
    }
}
