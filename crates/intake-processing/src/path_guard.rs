//! Path containment for untrusted relative paths
//!
//! `PathGuard` resolves attacker-controlled paths (archive entry names,
//! requested download names) against a fixed base directory. A resolved
//! destination is always strictly inside the canonical base; anything else is
//! rejected as a traversal attempt and logged as a security event.

use soft_canonicalize::soft_canonicalize;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathGuardError {
    #[error("Path traversal attempt: {candidate}")]
    TraversalAttempt { candidate: String },
}

/// A destination that has passed containment checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDestination {
    pub absolute_path: PathBuf,
}

impl ResolvedDestination {
    pub fn as_path(&self) -> &Path {
        &self.absolute_path
    }
}

#[derive(Debug, Clone)]
pub struct PathGuard {
    base_dir: PathBuf,
    flatten: bool,
}

impl PathGuard {
    /// Create a guard rooted at `base_dir`, creating the directory if needed.
    ///
    /// With `flatten` set, only the final segment of a candidate is kept.
    pub fn new(base_dir: impl AsRef<Path>, flatten: bool) -> io::Result<Self> {
        let base_dir = base_dir.as_ref();
        std::fs::create_dir_all(base_dir)?;
        let base_dir = std::fs::canonicalize(base_dir)?;
        Ok(Self { base_dir, flatten })
    }

    /// Canonical base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn flattens(&self) -> bool {
        self.flatten
    }

    /// Resolve a candidate using the guard's configured flattening.
    pub fn resolve(&self, candidate: &str) -> Result<ResolvedDestination, PathGuardError> {
        self.resolve_with(candidate, self.flatten)
    }

    /// Resolve a candidate with explicit flattening.
    ///
    /// Leading parent segments, root separators and drive prefixes are
    /// stripped before joining, so `../../etc/passwd` lands inside the base.
    pub fn resolve_with(
        &self,
        candidate: &str,
        flatten: bool,
    ) -> Result<ResolvedDestination, PathGuardError> {
        let normalized = candidate.replace('\\', "/");
        let stripped = strip_escaping_prefix(&normalized);

        let segments: Vec<String> = if flatten {
            stripped
                .rsplit('/')
                .find(|s| !s.is_empty())
                .map(sanitize_segment)
                .into_iter()
                .collect()
        } else {
            stripped.split('/').map(sanitize_segment).collect()
        };

        let relative: PathBuf = segments.into_iter().filter(|s| !s.is_empty()).collect();
        if relative.as_os_str().is_empty() {
            return Err(self.reject(candidate, "empty after sanitization"));
        }

        let joined = self.base_dir.join(relative);
        let canonical = soft_canonicalize(&joined)
            .map_err(|_| self.reject(candidate, "canonicalization failed"))?;

        // Component-wise, so a sibling like `/base-evil` is not inside `/base`
        if canonical == self.base_dir || !canonical.starts_with(&self.base_dir) {
            return Err(self.reject(candidate, "escapes base directory"));
        }

        Ok(ResolvedDestination {
            absolute_path: canonical,
        })
    }

    /// Resolve a path declared inside an archive.
    ///
    /// Archive entries are authored by the uploader, so a declared parent
    /// segment or absolute path is treated as a traversal attempt outright
    /// instead of being stripped.
    pub fn resolve_entry(
        &self,
        declared: &str,
        flatten: bool,
    ) -> Result<ResolvedDestination, PathGuardError> {
        if declares_traversal(declared) {
            return Err(self.reject(declared, "declared parent or absolute path"));
        }
        self.resolve_with(declared, flatten)
    }

    fn reject(&self, candidate: &str, reason: &str) -> PathGuardError {
        tracing::warn!(
            candidate = %candidate,
            base_dir = %self.base_dir.display(),
            reason = reason,
            "Path traversal attempt rejected"
        );
        PathGuardError::TraversalAttempt {
            candidate: candidate.to_string(),
        }
    }
}

/// Strip leading `../`, `/` and drive prefixes until none remain.
fn strip_escaping_prefix(path: &str) -> &str {
    let mut rest = path;
    loop {
        if let Some(r) = rest.strip_prefix("../") {
            rest = r;
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
        } else if rest == ".." {
            rest = "";
        } else if has_drive_prefix(rest) {
            rest = &rest[2..];
        } else {
            return rest;
        }
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn declares_traversal(path: &str) -> bool {
    let normalized = path.replace('\\', "/");
    normalized.starts_with('/')
        || has_drive_prefix(&normalized)
        || normalized.split('/').any(|segment| segment == "..")
}

/// Sanitize one path segment: control characters, reserved names and
/// `.`/`..` are removed.
fn sanitize_segment(segment: &str) -> String {
    sanitize_filename::sanitize(segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn guard(flatten: bool) -> (TempDir, PathGuard) {
        let dir = TempDir::new().unwrap();
        let guard = PathGuard::new(dir.path().join("complaints"), flatten).unwrap();
        (dir, guard)
    }

    #[test]
    fn test_strips_leading_parent_segments() {
        let (_dir, guard) = guard(false);
        let resolved = guard.resolve("../../etc/passwd").unwrap();
        assert_eq!(resolved.absolute_path, guard.base_dir().join("etc/passwd"));
    }

    #[test]
    fn test_any_parent_count_stays_inside() {
        let (_dir, guard) = guard(false);
        for depth in 0..12 {
            for tail in ["x.txt", "a/../../../b", "..\\..\\win.ini", "/abs/path", "C:/boot.ini"] {
                let candidate = format!("{}{}", "../".repeat(depth), tail);
                if let Ok(resolved) = guard.resolve(&candidate) {
                    assert!(resolved.absolute_path.starts_with(guard.base_dir()));
                    assert_ne!(resolved.absolute_path, guard.base_dir());
                }
            }
        }
    }

    #[test]
    fn test_flatten_keeps_last_segment() {
        let (_dir, guard) = guard(true);
        let resolved = guard.resolve("nested/dir/report.pdf").unwrap();
        assert_eq!(resolved.absolute_path, guard.base_dir().join("report.pdf"));
    }

    #[test]
    fn test_backslashes_are_separators() {
        let (_dir, guard) = guard(false);
        let resolved = guard.resolve("a\\b\\c.txt").unwrap();
        assert_eq!(resolved.absolute_path, guard.base_dir().join("a/b/c.txt"));
    }

    #[test]
    fn test_empty_and_dot_rejected() {
        let (_dir, guard) = guard(false);
        for candidate in ["", ".", "..", "../", "/", "./."] {
            assert!(
                matches!(
                    guard.resolve(candidate),
                    Err(PathGuardError::TraversalAttempt { .. })
                ),
                "{candidate:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_null_bytes_are_removed() {
        let (_dir, guard) = guard(true);
        let resolved = guard.resolve("evil\0.txt").unwrap();
        assert_eq!(resolved.absolute_path, guard.base_dir().join("evil.txt"));
    }

    #[test]
    fn test_sibling_prefix_is_not_contained() {
        let dir = TempDir::new().unwrap();
        let guard = PathGuard::new(dir.path().join("base"), false).unwrap();
        std::fs::create_dir_all(dir.path().join("base-evil")).unwrap();

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(dir.path().join("base-evil"), guard.base_dir().join("link"))
                .unwrap();
            assert!(guard.resolve("link/payload").is_err());
        }
        let sibling = soft_canonicalize(&dir.path().join("base-evil/x")).unwrap();
        assert!(!sibling.starts_with(guard.base_dir()));
    }

    #[test]
    fn test_entry_with_declared_traversal_rejected() {
        let (_dir, guard) = guard(true);
        for declared in ["../../etc/passwd", "a/../b", "/etc/passwd", "..\\x", "C:\\boot.ini"] {
            assert_eq!(
                guard.resolve_entry(declared, true),
                Err(PathGuardError::TraversalAttempt {
                    candidate: declared.to_string()
                })
            );
        }
        assert!(guard.resolve_entry("docs/readme.txt", false).is_ok());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let (_dir, guard) = guard(false);
        for candidate in ["a/b.txt", "../../x", "", "..\\..\\y"] {
            assert_eq!(guard.resolve(candidate), guard.resolve(candidate));
        }
    }
}
