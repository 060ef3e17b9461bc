//! Per-request temporary staging
//!
//! Every upload gets its own uniquely named directory under the staging root.
//! The handle removes it on `release` or, failing that, on drop, so a request
//! future that is cancelled mid-extraction still cleans up.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const DEFAULT_PREFIX: &str = "upload-";

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// Snapshot of acquire/release counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingStats {
    pub acquired: usize,
    pub released: usize,
}

impl StagingStats {
    /// Handles acquired but not yet released
    pub fn outstanding(&self) -> usize {
        self.acquired.saturating_sub(self.released)
    }
}

#[derive(Debug, Clone)]
pub struct TempStaging {
    root: PathBuf,
    prefix: String,
    counters: Arc<Counters>,
}

impl TempStaging {
    pub fn new(root: impl Into<PathBuf>, prefix: Option<&str>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.unwrap_or(DEFAULT_PREFIX).to_string(),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh, uniquely named staging directory.
    pub fn acquire(&self) -> io::Result<StagingHandle> {
        std::fs::create_dir_all(&self.root)?;
        let dir = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempdir_in(&self.root)?;

        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(path = %dir.path().display(), "Staging directory acquired");

        Ok(StagingHandle {
            dir: Some(dir),
            file_path: None,
            counters: self.counters.clone(),
        })
    }

    pub fn stats(&self) -> StagingStats {
        StagingStats {
            acquired: self.counters.acquired.load(Ordering::SeqCst),
            released: self.counters.released.load(Ordering::SeqCst),
        }
    }
}

/// Exclusively owned staging directory for one upload
#[derive(Debug)]
pub struct StagingHandle {
    dir: Option<TempDir>,
    file_path: Option<PathBuf>,
    counters: Arc<Counters>,
}

impl StagingHandle {
    /// Staging directory, or `None` once released
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(|d| d.path())
    }

    /// Path of the staged upload, if one has been written
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Write the uploaded bytes into the staging directory under the
    /// sanitized base name of `original_name`.
    pub async fn write(&mut self, original_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let dir = self
            .dir()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "staging handle released"))?;

        let base_name = original_name
            .replace('\\', "/")
            .rsplit('/')
            .map(sanitize_filename::sanitize)
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| "upload.bin".to_string());

        let path = dir.join(base_name);
        tokio::fs::write(&path, bytes).await?;
        self.file_path = Some(path.clone());
        Ok(path)
    }

    /// Remove the staging directory. Safe to call more than once; only the
    /// first call deletes anything. Deletion failures are logged, not returned.
    pub fn release(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };

        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to remove staging directory"
            );
        } else {
            tracing::debug!(path = %path.display(), "Staging directory released");
        }
        self.file_path = None;
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_released(&self) -> bool {
        self.dir.is_none()
    }
}

impl Drop for StagingHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging() -> (tempfile::TempDir, TempStaging) {
        let root = tempfile::TempDir::new().unwrap();
        let staging = TempStaging::new(root.path().join("staging"), None);
        (root, staging)
    }

    #[tokio::test]
    async fn test_write_then_release_removes_directory() {
        let (_root, staging) = staging();
        let mut handle = staging.acquire().unwrap();
        let path = handle.write("complaint.zip", b"PK").await.unwrap();
        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap() == "complaint.zip");

        let dir = handle.dir().unwrap().to_path_buf();
        handle.release();
        assert!(!dir.exists());
        assert!(handle.is_released());
    }

    #[tokio::test]
    async fn test_write_uses_sanitized_base_name() {
        let (_root, staging) = staging();
        let mut handle = staging.acquire().unwrap();
        let path = handle.write("../../etc/evil.zip", b"x").await.unwrap();
        assert_eq!(path.parent(), handle.dir());
        assert_eq!(path.file_name().unwrap(), "evil.zip");
    }

    #[test]
    fn test_release_is_idempotent() {
        let (_root, staging) = staging();
        let mut handle = staging.acquire().unwrap();
        handle.release();
        handle.release();
        drop(handle);
        assert_eq!(
            staging.stats(),
            StagingStats {
                acquired: 1,
                released: 1
            }
        );
    }

    #[test]
    fn test_drop_releases() {
        let (_root, staging) = staging();
        let dir = {
            let handle = staging.acquire().unwrap();
            handle.dir().unwrap().to_path_buf()
        };
        assert!(!dir.exists());
        assert_eq!(staging.stats().outstanding(), 0);
    }

    #[test]
    fn test_handles_are_unique() {
        let (_root, staging) = staging();
        let a = staging.acquire().unwrap();
        let b = staging.acquire().unwrap();
        assert_ne!(a.dir(), b.dir());
        assert!(a
            .dir()
            .unwrap()
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("upload-"));
    }

    #[tokio::test]
    async fn test_write_after_release_fails() {
        let (_root, staging) = staging();
        let mut handle = staging.acquire().unwrap();
        handle.release();
        assert!(handle.write("a.zip", b"x").await.is_err());
    }
}
