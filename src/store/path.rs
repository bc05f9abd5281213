//! Path utilities for the virtual store.
//!
//! Store paths are absolute, `/`-separated strings. They never touch the
//! host filesystem directly; backends map them as they see fit.

use super::error::{StoreError, StoreResult};

/// Normalize an absolute path: collapse `.` and empty components, resolve
/// `..`, and reject anything that would climb above the root.
pub fn normalize_path(path: &str) -> StoreResult<String> {
    if path.is_empty() {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "empty path",
        });
    }
    if !path.starts_with('/') {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "path must be absolute",
        });
    }
    if path.contains('\0') {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "path contains a null character",
        });
    }

    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if components.pop().is_none() {
                    return Err(StoreError::InvalidPath {
                        path: path.to_string(),
                        reason: "path escapes the root directory",
                    });
                }
            }
            c => components.push(c),
        }
    }

    if components.is_empty() {
        return Ok("/".to_string());
    }

    let mut result = String::with_capacity(path.len());
    for component in components {
        result.push('/');
        result.push_str(component);
    }
    Ok(result)
}

/// Parent of a normalized path. The root is its own parent.
pub fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(pos) => &path[..pos],
    }
}

/// Last component of a normalized path (empty for the root).
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Join a directory and a relative path with exactly one separator.
pub fn join_path(base: &str, name: &str) -> String {
    let name = name.trim_start_matches('/');
    if base == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}

/// Whether `path` is `base` itself or lives somewhere below it.
pub fn is_under(path: &str, base: &str) -> bool {
    if base == "/" {
        return true;
    }
    path.starts_with(base) && (path.len() == base.len() || path.as_bytes()[base.len()] == b'/')
}

/// Whether `name` can be used as a single path segment (an id or a filename).
pub fn is_single_segment(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}
