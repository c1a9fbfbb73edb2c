//! Compose format constants and default paths.

/// The only docker-compose schema version accepted by the translator.
pub const SUPPORTED_COMPOSE_VERSION: &str = "2";

/// Dockerfile name used when a service's build section names none.
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// Default compose file name, relative to the compose base directory.
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Default compose base directory, relative to the project root.
pub const DEFAULT_COMPOSE_BASEDIR: &str = "src/main/docker";
