//! Path validation: filesystem confinement to the workspace directory.
//!
//! Model-supplied paths are joined onto the workspace root, normalized
//! lexically (the target may not exist yet), then re-anchored on the
//! deepest existing ancestor. Symlinks, dangling ones included, are
//! followed, so none can be used to step outside.

use std::path::{Component, Path, PathBuf};

/// Error returned when path validation fails.
#[derive(Debug, thiserror::Error)]
pub enum PathValidationError {
    #[error("Path escapes workspace: {path}")]
    EscapesWorkspace { path: String },

    #[error("Failed to canonicalize path '{path}': {reason}")]
    CanonicalizeFailed { path: String, reason: String },
}

/// Resolve `path` relative to `workspace` and make sure it stays inside.
///
/// Absolute paths are accepted only when they already point into the
/// workspace. Returns the resolved absolute path on success.
pub fn resolve_in_workspace(workspace: &Path, path: &str) -> Result<PathBuf, PathValidationError> {
    let root = workspace
        .canonicalize()
        .map_err(|e| PathValidationError::CanonicalizeFailed {
            path: workspace.display().to_string(),
            reason: e.to_string(),
        })?;

    let joined = normalize(&root.join(path));
    if !joined.starts_with(&root) {
        return Err(PathValidationError::EscapesWorkspace { path: path.into() });
    }

    let resolved = resolve_links(&joined, 0).map_err(|e| PathValidationError::CanonicalizeFailed {
        path: path.into(),
        reason: e.to_string(),
    })?;

    if !resolved.starts_with(&root) {
        tracing::warn!(path, resolved = %resolved.display(), "Path resolves outside workspace");
        return Err(PathValidationError::EscapesWorkspace { path: path.into() });
    }

    Ok(resolved)
}

/// Symlink hops followed before giving up, as with `ELOOP`.
const MAX_LINK_HOPS: usize = 40;

/// Resolve every symlink along `path`, including dangling ones.
///
/// The deepest ancestor that exists as a directory entry is canonicalized
/// and the missing tail re-attached. A dangling link is followed through
/// `read_link` so a not-yet-created target is judged by where it points.
fn resolve_links(path: &Path, hops: usize) -> std::io::Result<PathBuf> {
    if hops > MAX_LINK_HOPS {
        return Err(std::io::Error::other("too many levels of symbolic links"));
    }

    let mut existing = path;
    let mut rest = Vec::new();
    while std::fs::symlink_metadata(existing).is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = match existing.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) if is_symlink(existing) => {
            let target = std::fs::read_link(existing)?;
            let base = existing.parent().unwrap_or(Path::new("/"));
            resolve_links(&normalize(&base.join(target)), hops + 1)?
        }
        Err(e) => return Err(e),
    };
    for name in rest.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_inside_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_in_workspace(dir.path(), "src/main.rs").unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(resolved, root.join("src").join("main.rs"));
    }

    #[test]
    fn inner_parent_components_are_fine() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_in_workspace(dir.path(), "a/b/../c.txt").unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(resolved, root.join("a").join("c.txt"));
    }

    #[test]
    fn path_traversal_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_in_workspace(dir.path(), "../../../etc/passwd").unwrap_err();
        assert!(matches!(err, PathValidationError::EscapesWorkspace { .. }));
        assert!(err.to_string().contains("Path escapes workspace"));
    }

    #[test]
    fn absolute_path_outside_blocked() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_in_workspace(dir.path(), "/etc/passwd").is_err());
    }

    #[test]
    fn absolute_path_inside_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let inside = root.join("notes.md");
        let resolved = resolve_in_workspace(dir.path(), inside.to_str().unwrap()).unwrap();
        assert_eq!(resolved, inside);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        let err = resolve_in_workspace(dir.path(), "link/secret.txt").unwrap_err();
        assert!(matches!(err, PathValidationError::EscapesWorkspace { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_to_outside_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let target = outside.path().join("escaped.txt");
        std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();

        let err = resolve_in_workspace(dir.path(), "link").unwrap_err();
        assert!(matches!(err, PathValidationError::EscapesWorkspace { .. }));
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_inside_resolves_to_target() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("notes/new.md", dir.path().join("link")).unwrap();

        let resolved = resolve_in_workspace(dir.path(), "link").unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(resolved, root.join("notes").join("new.md"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink("b", dir.path().join("a")).unwrap();
        std::os::unix::fs::symlink("a", dir.path().join("b")).unwrap();

        let err = resolve_in_workspace(dir.path(), "a").unwrap_err();
        assert!(matches!(err, PathValidationError::CanonicalizeFailed { .. }));
    }

    #[test]
    fn normalize_collapses_components() {
        let p = normalize(Path::new("/a/./b/../c"));
        assert_eq!(p, PathBuf::from("/a/c"));
    }
}
