//! Translation driver: compose file in, resolved image configurations out.

use std::path::{Path, PathBuf};

use dockyard_common::config::ImageConfiguration;

use crate::error::{ComposeError, LoadError, Result};
use crate::loader::{DocumentLoader, FileLoader};
use crate::merge::resolve_image;
use crate::path::resolve_compose_file;
use crate::service::normalize;
use crate::value::ComposeValue;
use crate::version::check_version;

/// Translates compose files with a given document loader.
#[derive(Debug, Clone, Default)]
pub struct Translator<L = FileLoader> {
    loader: L,
}

impl<L: DocumentLoader> Translator<L> {
    /// Creates a translator on top of `loader`.
    pub const fn new(loader: L) -> Self {
        Self { loader }
    }

    /// Resolves one image configuration per compose service.
    ///
    /// The compose file is located through the baseline's external section
    /// relative to `project_root`. Documents are processed in stream order
    /// and services in declaration order.
    ///
    /// # Errors
    ///
    /// Fails without partial output when the baseline has no external
    /// section, the file cannot be loaded, a document has an unsupported
    /// version or a malformed `services` section, or a supported field
    /// cannot be normalized.
    pub fn translate(
        &self,
        baseline: &ImageConfiguration,
        project_root: &Path,
    ) -> Result<Vec<ImageConfiguration>> {
        let external = baseline
            .external
            .as_ref()
            .ok_or(ComposeError::MissingExternalConfig)?;
        let compose_file =
            resolve_compose_file(&external.basedir, &external.compose_file, project_root);
        let compose_file =
            std::path::absolute(&compose_file).map_err(|err| ComposeError::ExternalConfig {
                path: compose_file.clone(),
                source: LoadError::from(err),
            })?;
        tracing::info!(path = %compose_file.display(), "translating compose file");

        let documents = self
            .loader
            .load(&compose_file)
            .map_err(|source| ComposeError::ExternalConfig {
                path: compose_file.clone(),
                source,
            })?;
        let compose_parent = compose_file
            .parent()
            .map_or_else(PathBuf::new, Path::to_path_buf);

        let mut resolved = Vec::new();
        for (index, document) in documents.iter().enumerate() {
            tracing::debug!(document = index, "processing compose document");
            let document = document.as_mapping().ok_or_else(|| ComposeError::MalformedService {
                path: compose_file.clone(),
                message: format!("document {index} is a {}, not a mapping", document.kind()),
            })?;
            check_version(document, &compose_file)?;

            let services = match document.get("services") {
                Some(ComposeValue::Mapping(services)) => services,
                Some(other) => {
                    return Err(ComposeError::MalformedService {
                        path: compose_file,
                        message: format!("\"services\" is a {}, not a mapping", other.kind()),
                    });
                }
                None => {
                    return Err(ComposeError::MalformedService {
                        path: compose_file,
                        message: format!("document {index} has no \"services\" section"),
                    });
                }
            };
            if services.is_empty() {
                tracing::debug!(document = index, "document declares no services");
            }

            for (name, definition) in services.iter() {
                let definition =
                    definition
                        .as_mapping()
                        .ok_or_else(|| ComposeError::MalformedService {
                            path: compose_file.clone(),
                            message: format!(
                                "service \"{name}\" is a {}, not a mapping",
                                definition.kind()
                            ),
                        })?;
                let service = normalize(name, &compose_file, definition)?;
                resolved.push(resolve_image(&service, &compose_parent, baseline));
            }
        }

        tracing::info!(count = resolved.len(), "resolved image configurations");
        Ok(resolved)
    }
}

/// Translates the compose file referenced by `baseline` with a
/// [`FileLoader`] that has an empty template context.
///
/// # Errors
///
/// See [`Translator::translate`].
pub fn translate(baseline: &ImageConfiguration, project_root: &Path) -> Result<Vec<ImageConfiguration>> {
    Translator::new(FileLoader::new()).translate(baseline, project_root)
}

#[cfg(test)]
mod tests {
    use dockyard_common::config::ComposeExternalConfig;

    use super::*;
    use crate::loader::parse_documents;

    /// Serves a fixed YAML text for any path.
    struct StaticLoader(&'static str);

    impl DocumentLoader for StaticLoader {
        fn load(&self, _path: &Path) -> std::result::Result<Vec<ComposeValue>, LoadError> {
            parse_documents(self.0)
        }
    }

    struct FailingLoader;

    impl DocumentLoader for FailingLoader {
        fn load(&self, _path: &Path) -> std::result::Result<Vec<ComposeValue>, LoadError> {
            Err(LoadError::NotFound)
        }
    }

    fn baseline() -> ImageConfiguration {
        ImageConfiguration {
            external: Some(ComposeExternalConfig {
                basedir: "docker".into(),
                compose_file: "docker-compose.yml".into(),
            }),
            ..ImageConfiguration::default()
        }
    }

    fn run(yaml: &'static str) -> Result<Vec<ImageConfiguration>> {
        Translator::new(StaticLoader(yaml)).translate(&baseline(), Path::new("/proj"))
    }

    #[test]
    fn translate_requires_external_section() {
        let err = Translator::new(StaticLoader(""))
            .translate(&ImageConfiguration::default(), Path::new("/proj"))
            .expect_err("no external");
        assert!(matches!(err, ComposeError::MissingExternalConfig));
    }

    #[test]
    fn translate_wraps_loader_failure() {
        let err = Translator::new(FailingLoader)
            .translate(&baseline(), Path::new("/proj"))
            .expect_err("load failure");
        match err {
            ComposeError::ExternalConfig { path, source } => {
                assert_eq!(path, PathBuf::from("/proj/docker/docker-compose.yml"));
                assert!(matches!(source, LoadError::NotFound));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn translate_preserves_declaration_order() {
        let resolved = run("version: '2'\nservices:\n  zeta: {image: z}\n  alpha: {image: a}\n  mid: {image: m}\n")
            .expect("translated");
        let aliases: Vec<_> = resolved.iter().filter_map(|c| c.alias.as_deref()).collect();
        assert_eq!(aliases, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn translate_concatenates_documents() {
        let resolved = run(
            "version: '2'\nservices:\n  a: {image: a}\n---\nversion: 2\nservices:\n  b: {image: b}\n  c: {image: c}\n",
        )
        .expect("translated");
        let aliases: Vec<_> = resolved.iter().filter_map(|c| c.alias.as_deref()).collect();
        assert_eq!(aliases, vec!["a", "b", "c"]);
    }

    #[test]
    fn translate_rejects_whole_stream_on_bad_version() {
        let err = run("version: '2'\nservices:\n  a: {image: a}\n---\nversion: '3'\nservices:\n  b: {image: b}\n")
            .expect_err("bad version");
        assert!(
            matches!(err, ComposeError::UnsupportedVersion { path } if path == Path::new("/proj/docker/docker-compose.yml"))
        );
    }

    #[test]
    fn translate_rejects_missing_services() {
        let err = run("version: '2'\n").expect_err("no services");
        assert!(matches!(err, ComposeError::MalformedService { .. }));
    }

    #[test]
    fn translate_rejects_non_mapping_services() {
        let err = run("version: '2'\nservices: [web]\n").expect_err("bad services");
        assert!(matches!(err, ComposeError::MalformedService { .. }));
    }

    #[test]
    fn translate_rejects_non_mapping_service_entry() {
        let err = run("version: '2'\nservices:\n  web: nginx\n").expect_err("bad service");
        assert!(matches!(err, ComposeError::MalformedService { message, .. } if message.contains("web")));
    }

    #[test]
    fn translate_rejects_non_mapping_document() {
        let err = run("- version: '2'\n").expect_err("bad document");
        assert!(matches!(err, ComposeError::MalformedService { .. }));
    }

    #[test]
    fn translate_accepts_empty_services_mapping() {
        let resolved = run("version: '2'\nservices: {}\n").expect("translated");
        assert!(resolved.is_empty());
    }

    #[test]
    fn translate_anchors_dockerfile_at_compose_directory() {
        let resolved = run("version: '2'\nservices:\n  app:\n    build: ./app\n").expect("translated");
        let dockerfile = resolved[0]
            .build
            .as_ref()
            .and_then(|b| b.dockerfile.clone());
        assert_eq!(dockerfile, Some(PathBuf::from("/proj/docker/app/Dockerfile")));
    }

    #[test]
    fn translate_makes_relative_project_root_absolute() {
        let resolved = Translator::new(StaticLoader(
            "version: '2'\nservices:\n  app:\n    build: ./app\n",
        ))
        .translate(&baseline(), Path::new("."))
        .expect("translated");
        let dockerfile = resolved[0]
            .build
            .as_ref()
            .and_then(|b| b.dockerfile.clone())
            .expect("dockerfile");
        assert!(dockerfile.is_absolute(), "{} is relative", dockerfile.display());
        assert!(dockerfile.ends_with("docker/app/Dockerfile"));
    }

    #[test]
    fn translate_reports_absolute_compose_path_on_failure() {
        let err = Translator::new(FailingLoader)
            .translate(&baseline(), Path::new("project"))
            .expect_err("load failure");
        assert!(
            matches!(err, ComposeError::ExternalConfig { path, .. } if path.is_absolute() && path.ends_with("project/docker/docker-compose.yml"))
        );
    }

    #[test]
    fn translate_surfaces_invalid_fields() {
        let err = run("version: '2'\nservices:\n  web:\n    environment: FOO\n").expect_err("invalid");
        assert!(
            matches!(err, ComposeError::InvalidField { service, field, .. } if service == "web" && field == "environment")
        );
    }
}
