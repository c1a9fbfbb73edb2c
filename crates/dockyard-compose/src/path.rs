//! Path resolution for compose files and Dockerfiles.
//!
//! Pure functions, no file-system access. The compose file is anchored at
//! the project root while Dockerfiles are anchored at the compose file's
//! own directory.

use std::path::{Component, Path, PathBuf};

use dockyard_common::constants::DEFAULT_DOCKERFILE;

/// Resolves the compose file referenced by a baseline configuration.
///
/// An absolute `compose_file` is returned unchanged, anything else is
/// joined as `project_base_dir / base_dir / compose_file`.
#[must_use]
pub fn resolve_compose_file(base_dir: &str, compose_file: &str, project_base_dir: &Path) -> PathBuf {
    let compose = Path::new(compose_file);
    if compose.is_absolute() {
        compose.to_path_buf()
    } else {
        project_base_dir.join(base_dir).join(compose)
    }
}

/// Resolves the Dockerfile of a service that is built from a context.
///
/// `build_dir / dockerfile` (default `Dockerfile`) is returned unchanged
/// when absolute, otherwise it is joined onto `compose_parent` and `.`/`..`
/// segments are folded.
#[must_use]
pub fn resolve_dockerfile(build_dir: &str, dockerfile: Option<&str>, compose_parent: &Path) -> PathBuf {
    let candidate = Path::new(build_dir).join(dockerfile.unwrap_or(DEFAULT_DOCKERFILE));
    if candidate.is_absolute() {
        candidate
    } else {
        normalize(&compose_parent.join(candidate))
    }
}

/// Folds `.` and `..` segments without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    let _ = out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
