//! Error types raised while translating a compose file.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of the document loader collaborator.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The compose file does not exist.
    #[error("file not found")]
    NotFound,

    /// The compose file could not be read.
    #[error("read failed: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A `${` placeholder is never closed.
    #[error("unterminated template placeholder at byte {offset}")]
    UnterminatedPlaceholder {
        /// Byte offset of the opening `$`.
        offset: usize,
    },

    /// The text is not valid YAML.
    #[error("invalid YAML: {source}")]
    Yaml {
        /// Underlying parser error.
        #[from]
        source: serde_yaml::Error,
    },

    /// The YAML uses a construct the compose model cannot represent.
    #[error("unsupported YAML structure: {message}")]
    Structure {
        /// Description of the construct.
        message: String,
    },
}

/// Why a compose value could not be coerced into the shape a field needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The value has the wrong kind, e.g. a mapping where a list belongs.
    #[error("expected {expected}, found a {found}")]
    Kind {
        /// Accepted shapes.
        expected: &'static str,
        /// Shape actually found.
        found: &'static str,
    },

    /// The value has the right kind but unparsable text.
    #[error("expected {expected}, found \"{raw}\"")]
    Text {
        /// Accepted form.
        expected: &'static str,
        /// Offending text.
        raw: String,
    },

    /// A byte size uses an unknown unit suffix.
    #[error("unknown byte size unit \"{unit}\" in \"{raw}\"")]
    UnknownUnit {
        /// Offending suffix.
        unit: String,
        /// Full value.
        raw: String,
    },

    /// A byte size is negative (other than `-1`) or does not fit.
    #[error("byte size \"{raw}\" is out of range")]
    OutOfRange {
        /// Full value.
        raw: String,
    },

    /// More than one network attachment.
    #[error("only a single network is supported, found {count}")]
    TooManyNetworks {
        /// Number of networks declared.
        count: usize,
    },

    /// The restart policy is not one of the known names.
    #[error("unknown restart policy \"{raw}\"")]
    UnknownRestartPolicy {
        /// Offending policy.
        raw: String,
    },

    /// A nested entry is malformed.
    #[error("{key}: {source}")]
    Entry {
        /// Key of the nested entry.
        key: String,
        /// What is wrong with it.
        source: Box<ShapeError>,
    },
}

impl ShapeError {
    /// Attributes the error to the nested entry `key`.
    #[must_use]
    pub fn at(self, key: impl Into<String>) -> Self {
        Self::Entry {
            key: key.into(),
            source: Box::new(self),
        }
    }
}

/// Error type for compose translation. Every variant aborts the whole call.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The baseline configuration does not reference a compose file.
    #[error("image configuration has no external compose section")]
    MissingExternalConfig,

    /// A document declares a version other than the supported one.
    #[error("only version 2 of the docker-compose format is supported for {}", path.display())]
    UnsupportedVersion {
        /// Compose file holding the document.
        path: PathBuf,
    },

    /// The loader could not produce documents for the compose file.
    #[error("failed to load external configuration: {}: {source}", path.display())]
    ExternalConfig {
        /// Compose file that failed to load.
        path: PathBuf,
        /// Loader failure.
        #[source]
        source: LoadError,
    },

    /// A document or its `services` section is not shaped as expected.
    #[error("malformed compose file {}: {message}", path.display())]
    MalformedService {
        /// Compose file holding the document.
        path: PathBuf,
        /// What is wrong with the structure.
        message: String,
    },

    /// A supported service field has a shape that cannot be normalized.
    #[error("invalid \"{field}\" in service \"{service}\": {source}")]
    InvalidField {
        /// Service name.
        service: String,
        /// Compose key of the field.
        field: String,
        /// Why the value was rejected.
        #[source]
        source: ShapeError,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ComposeError>;
