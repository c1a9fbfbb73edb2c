//! # dockyard-compose
//!
//! Translator from docker-compose files (schema version 2) to resolved
//! image configurations.
//!
//! Handles:
//! - **Value**: Untyped compose values and shape coercions.
//! - **Path**: Compose file and Dockerfile location.
//! - **Loader**: Reading, `${name}` substitution and YAML parsing.
//! - **Version**: The version 2 gate.
//! - **Service**: Normalization of one service, ignoring unsupported keys.
//! - **Merge**: Field-by-field override of the baseline configuration.
//! - **Translate**: The driver tying the steps together.

pub mod error;
pub mod loader;
pub mod merge;
pub mod path;
pub mod service;
pub mod translate;
pub mod value;
pub mod version;

pub use error::{ComposeError, LoadError, Result, ShapeError};
pub use loader::{DocumentLoader, FileLoader};
pub use translate::{Translator, translate};
