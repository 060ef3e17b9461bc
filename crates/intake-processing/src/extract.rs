//! Archive extraction
//!
//! The staged archive is opened through its central directory and entries are
//! streamed one at a time in index order, so memory stays bounded by a single
//! entry's buffers regardless of entry size. Entries written with a trailing
//! data descriptor are handled like any other. Each entry is isolated: a
//! rejected path or a failed write is recorded in the outcome and the loop
//! moves on. Only a broken archive framing aborts the whole extraction.

use crate::path_guard::{PathGuard, ResolvedDestination};
use intake_core::{ChallengeKind, ChallengeSignal};
use serde::Serialize;
use soft_canonicalize::soft_canonicalize;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Failed to open archive: {0}")]
    Open(#[from] io::Error),

    #[error("Corrupt archive: {0}")]
    DecodeFatal(String),

    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

/// Why a single entry was not extracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    PathTraversal,
    Stream(String),
    EntryLimit,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::PathTraversal => write!(f, "path traversal attempt"),
            FailureReason::Stream(msg) => write!(f, "stream error: {}", msg),
            FailureReason::EntryLimit => write!(f, "entry limit exceeded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    pub relative_path: String,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub succeeded_count: usize,
    pub failed_entries: Vec<FailedEntry>,
}

impl ExtractionOutcome {
    fn fail(&mut self, relative_path: &str, reason: FailureReason) {
        self.failed_entries.push(FailedEntry {
            relative_path: relative_path.to_string(),
            reason,
        });
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Keep the directory components an entry declares instead of only its file name
    pub preserve_directory_structure: bool,
    pub max_entries: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            preserve_directory_structure: false,
            max_entries: 10_000,
        }
    }
}

#[derive(Clone)]
pub struct ArchiveExtractor {
    guard: PathGuard,
    signal: Arc<dyn ChallengeSignal>,
    sentinel: Option<PathBuf>,
}

impl ArchiveExtractor {
    /// `sentinel` is the destination whose write is reported as an
    /// unexpected zip path write. Relative paths resolve against the working
    /// directory.
    pub fn new(guard: PathGuard, signal: Arc<dyn ChallengeSignal>, sentinel: Option<&Path>) -> Self {
        let sentinel = sentinel.and_then(|p| soft_canonicalize(p).ok());
        Self {
            guard,
            signal,
            sentinel,
        }
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// Extract the archive at `archive_path` on a blocking worker.
    pub async fn extract(
        &self,
        archive_path: &Path,
        options: &ExtractOptions,
    ) -> Result<ExtractionOutcome, ExtractError> {
        let extractor = self.clone();
        let archive_path = archive_path.to_path_buf();
        let options = options.clone();

        tokio::task::spawn_blocking(move || extractor.extract_blocking(&archive_path, &options))
            .await
            .map_err(|e| ExtractError::Worker(e.to_string()))?
    }

    pub fn extract_blocking(
        &self,
        archive_path: &Path,
        options: &ExtractOptions,
    ) -> Result<ExtractionOutcome, ExtractError> {
        let file = File::open(archive_path)?;
        self.extract_from_reader(BufReader::new(file), options)
    }

    /// Decode loop over a seekable archive, one entry at a time in index order.
    pub fn extract_from_reader<R: Read + Seek>(
        &self,
        reader: R,
        options: &ExtractOptions,
    ) -> Result<ExtractionOutcome, ExtractError> {
        let mut archive = zip::ZipArchive::new(reader).map_err(|e| {
            tracing::warn!(error = %e, "Archive directory could not be read");
            ExtractError::DecodeFatal(e.to_string())
        })?;
        let mut outcome = ExtractionOutcome::default();
        let mut seen = 0usize;

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        index = index,
                        succeeded = outcome.succeeded_count,
                        failed = outcome.failed_entries.len(),
                        "Archive decoding failed"
                    );
                    return Err(ExtractError::DecodeFatal(e.to_string()));
                }
            };

            if entry.is_dir() {
                continue;
            }

            let declared = entry.name().to_string();
            seen += 1;

            if seen > options.max_entries {
                outcome.fail(&declared, FailureReason::EntryLimit);
                continue;
            }

            let destination = match self
                .guard
                .resolve_entry(&declared, !options.preserve_directory_structure)
            {
                Ok(destination) => destination,
                Err(_) => {
                    outcome.fail(&declared, FailureReason::PathTraversal);
                    continue;
                }
            };

            self.observe_destination(&destination);

            match write_entry(&mut entry, destination.as_path()) {
                Ok(bytes) => {
                    outcome.succeeded_count += 1;
                    tracing::debug!(
                        entry = %declared,
                        destination = %destination.as_path().display(),
                        bytes = bytes,
                        "Archive entry extracted"
                    );
                }
                Err(e) => {
                    tracing::warn!(entry = %declared, error = %e, "Archive entry failed");
                    outcome.fail(&declared, FailureReason::Stream(e.to_string()));
                }
            }
        }

        tracing::info!(
            succeeded = outcome.succeeded_count,
            failed = outcome.failed_entries.len(),
            "Archive extraction finished"
        );
        Ok(outcome)
    }

    fn observe_destination(&self, destination: &ResolvedDestination) {
        if let Some(sentinel) = &self.sentinel {
            self.signal.report(ChallengeKind::UnexpectedZipPathWrite, &|| {
                destination.as_path() == sentinel.as_path()
            });
        }
    }
}

/// Stream one entry to its destination. At most one destination file is open
/// at a time; the count is only returned once the data is synced to disk.
fn write_entry<R: Read>(entry: &mut R, destination: &Path) -> io::Result<u64> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(destination)?;
    let mut writer = BufWriter::new(file);
    let result = io::copy(entry, &mut writer).and_then(|bytes| {
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(bytes)
    });

    if result.is_err() {
        drop(writer);
        if let Err(e) = std::fs::remove_file(destination) {
            tracing::debug!(error = %e, "Failed to remove partial entry");
        }
    }
    result
}
