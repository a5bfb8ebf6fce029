//! Containment checks for files served from the packaged output root.

use crate::error::ProtocolError;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Return the canonical output root.
pub async fn output_root(root: &Path) -> Result<PathBuf, ProtocolError> {
    tokio::fs::canonicalize(root)
        .await
        .map_err(|e| ProtocolError::NotFound(format!("output root {}: {e}", root.display())))
}

/// Resolve a request-relative path to an existing file inside `root`.
///
/// The lexical form is checked first (no absolute or prefix components), then
/// the canonical path, so symlinks pointing outside the root are rejected too.
pub async fn resolve_contained(relative: &str, root: &Path) -> Result<PathBuf, ProtocolError> {
    let candidate = lexical_relative(relative)?;
    let root = output_root(root).await?;
    let canonical = tokio::fs::canonicalize(root.join(candidate))
        .await
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => ProtocolError::NotFound(relative.to_string()),
            _ => ProtocolError::Io(e),
        })?;
    ensure_within_root(relative, &canonical, &root)?;
    Ok(canonical)
}

/// Normalize `relative`, refusing anything that climbs out of the root.
fn lexical_relative(relative: &str) -> Result<PathBuf, ProtocolError> {
    let mut out = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::CurDir => {}
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(ProtocolError::OutsideRoot(relative.to_string()));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ProtocolError::OutsideRoot(relative.to_string()));
            }
        }
    }
    Ok(out)
}

fn ensure_within_root(original: &str, resolved: &Path, root: &Path) -> Result<(), ProtocolError> {
    if !resolved.starts_with(root) {
        return Err(ProtocolError::OutsideRoot(original.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolves_nested_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "x").unwrap();

        let path = resolve_contained("assets/./app.js", dir.path()).await.unwrap();
        assert!(path.ends_with("assets/app.js"));
    }

    #[tokio::test]
    async fn test_parent_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let err = resolve_contained("../../../etc/passwd", dir.path()).await.unwrap_err();
        assert!(matches!(err, ProtocolError::OutsideRoot(_)));
    }

    #[tokio::test]
    async fn test_inner_parent_allowed_when_contained() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("index.html"), "x").unwrap();
        assert!(resolve_contained("a/../index.html", dir.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_absolute_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            resolve_contained("/etc/passwd", dir.path()).await,
            Err(ProtocolError::OutsideRoot(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            resolve_contained("nope.html", dir.path()).await,
            Err(ProtocolError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape_rejected() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.txt"), "s").unwrap();
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
            .unwrap();

        assert!(matches!(
            resolve_contained("link.txt", dir.path()).await,
            Err(ProtocolError::OutsideRoot(_))
        ));
    }
}
