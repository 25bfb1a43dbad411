//! Path canonicalization and name validation.

use crate::config::LayoutConfig;
use crate::error::{StoreError, StoreResult};
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem, so it works for paths
/// that have not been committed yet.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match normalized.components().next_back() {
                    Some(Component::Normal(_)) => normalized.pop(),
                    _ => false,
                };
                if !popped && !normalized.has_root() {
                    normalized.push("..");
                }
            }
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component.as_os_str());
            }
        }
    }
    normalized
}

/// Check that `name` maps onto exactly one entry inside a directory and does
/// not shadow one of the reserved layout documents.
pub fn validate_name(name: &str, layout: &LayoutConfig) -> StoreResult<()> {
    let invalid = |reason| StoreError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name refers to a relative directory"));
    }
    if name.chars().any(std::path::is_separator) || name.contains('\0') {
        return Err(invalid("name must be a single path component"));
    }
    if layout.is_reserved(name) {
        return Err(invalid("name is reserved by the directory layout"));
    }
    Ok(())
}

/// Resolve `relative` below `root`, rejecting anything that escapes it.
pub fn resolve_below(root: &Path, relative: &Path) -> StoreResult<PathBuf> {
    let joined = if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        root.join(relative)
    };
    let resolved = normalize_path(&joined);
    if !resolved.starts_with(root) || resolved == root {
        return Err(StoreError::InvalidName {
            name: relative.display().to_string(),
            reason: "path must resolve strictly below the root",
        });
    }
    Ok(resolved)
}
