//! Compose schema version gate.

use std::path::Path;

use dockyard_common::constants::SUPPORTED_COMPOSE_VERSION;

use crate::error::{ComposeError, Result};
use crate::value::Mapping;

/// Accepts a document only if its `version` reads as `"2"`.
///
/// Numbers count by their textual form, so `2` passes and `2.0` does not.
///
/// # Errors
///
/// Returns [`ComposeError::UnsupportedVersion`] naming `path` when the
/// version is missing or differs.
pub fn check_version(document: &Mapping, path: &Path) -> Result<()> {
    let version = document
        .get("version")
        .and_then(crate::value::ComposeValue::scalar_text);
    match version {
        Some(v) if v.trim() == SUPPORTED_COMPOSE_VERSION => Ok(()),
        other => {
            tracing::debug!(path = %path.display(), version = ?other, "rejecting compose document");
            Err(ComposeError::UnsupportedVersion {
                path: path.to_path_buf(),
            })
        }
    }
}
