//! Upload pipeline
//!
//! Composes validation, staging, extraction and sandboxed XML parsing for the
//! two upload flows. Every staging handle acquired here is released exactly
//! once on every path out of `handle_zip_upload`.

use crate::extract::{ArchiveExtractor, ExtractError, ExtractOptions, ExtractionOutcome};
use crate::path_guard::PathGuard;
use crate::staging::{StagingHandle, StagingStats, TempStaging};
use crate::validator::{UploadRules, UploadValidator, ValidationError};
use crate::xml::{DisclosureDetector, SandboxedXmlParser, XmlParseError, XmlParseOptions};
use anyhow::Context;
use intake_core::{ChallengeKind, ChallengeSignal, Config, UploadedFile};
use std::io;
use std::sync::Arc;

/// Longest document excerpt echoed back to the client
pub const RENDERING_LIMIT: usize = 400;

const DEPRECATION_PREFIX: &str =
    "B2B customer complaints via file upload have been deprecated for security reasons";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("File upload not allowed in this environment")]
    Disabled,

    #[error("Failed to stage upload: {0}")]
    Staging(#[source] io::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractError),
}

/// Result of an XML upload; every variant is a client-facing outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlUploadResult {
    /// Parsed; carries the truncated rendering
    Deprecated { rendering: String },
    Timeout,
    ParseFailed { message: String },
    /// Parsing disabled in this environment
    Disabled,
}

impl XmlUploadResult {
    pub fn client_message(&self, file_name: &str) -> String {
        match self {
            XmlUploadResult::Deprecated { rendering } => {
                format!("{}: {} ({})", DEPRECATION_PREFIX, rendering, file_name)
            }
            XmlUploadResult::ParseFailed { message } => {
                format!(
                    "{}: {} ({})",
                    DEPRECATION_PREFIX,
                    truncate(message, RENDERING_LIMIT),
                    file_name
                )
            }
            XmlUploadResult::Disabled => format!("{} ({})", DEPRECATION_PREFIX, file_name),
            XmlUploadResult::Timeout => {
                "Sorry, we are temporarily not available! Please try again later.".to_string()
            }
        }
    }
}

pub struct UploadPipeline {
    zip_validator: UploadValidator,
    xml_validator: UploadValidator,
    staging: TempStaging,
    extractor: ArchiveExtractor,
    extract_options: ExtractOptions,
    xml_parser: SandboxedXmlParser,
    detector: DisclosureDetector,
    signal: Arc<dyn ChallengeSignal>,
    safe_mode: bool,
}

impl UploadPipeline {
    pub fn from_config(config: &Config, signal: Arc<dyn ChallengeSignal>) -> anyhow::Result<Self> {
        let guard = PathGuard::new(config.upload_dir(), !config.preserve_archive_paths())
            .with_context(|| {
                format!(
                    "Failed to prepare upload directory {}",
                    config.upload_dir().display()
                )
            })?;

        let extractor = ArchiveExtractor::new(
            guard,
            signal.clone(),
            Some(config.sentinel_path().as_path()),
        );

        let xml_parser = SandboxedXmlParser::new(XmlParseOptions {
            timeout: config.xml_parse_timeout(),
            max_entity_depth: config.xml_max_entity_depth(),
            max_expanded_bytes: config.xml_max_expanded_bytes(),
        })?;

        Ok(Self {
            zip_validator: UploadValidator::new(UploadRules::new(
                config.allowed_extensions(),
                config.max_upload_size_bytes(),
            )),
            xml_validator: UploadValidator::new(UploadRules::new(
                &["xml".to_string()],
                config.max_upload_size_bytes(),
            )),
            staging: TempStaging::new(config.staging_dir(), None),
            extractor,
            extract_options: ExtractOptions {
                preserve_directory_structure: config.preserve_archive_paths(),
                max_entries: config.max_archive_entries(),
            },
            xml_parser,
            detector: DisclosureDetector::new()?,
            signal,
            safe_mode: config.safe_mode(),
        })
    }

    pub fn staging_stats(&self) -> StagingStats {
        self.staging.stats()
    }

    pub fn extractor(&self) -> &ArchiveExtractor {
        &self.extractor
    }

    fn validate(&self, validator: &UploadValidator, file: &UploadedFile) -> Result<(), ValidationError> {
        validator.validate(file).inspect_err(|e| {
            tracing::warn!(
                file_name = %file.name(),
                size = file.size_bytes,
                code = e.code(),
                "Upload rejected"
            );
            if let Some(kind) = e.challenge_kind() {
                self.signal.report(kind, &|| true);
            }
        })
    }

    /// Validate, stage and extract a zip upload.
    #[tracing::instrument(skip(self, file), fields(file_name = %file.name(), size = file.size_bytes))]
    pub async fn handle_zip_upload(
        &self,
        file: UploadedFile,
    ) -> Result<ExtractionOutcome, PipelineError> {
        self.validate(&self.zip_validator, &file)?;

        if self.safe_mode {
            return Err(PipelineError::Disabled);
        }

        let mut handle = self.staging.acquire().map_err(PipelineError::Staging)?;
        let result = self.stage_and_extract(&mut handle, &file).await;
        handle.release();
        result
    }

    async fn stage_and_extract(
        &self,
        handle: &mut StagingHandle,
        file: &UploadedFile,
    ) -> Result<ExtractionOutcome, PipelineError> {
        let archive_path = handle
            .write(file.name(), &file.content)
            .await
            .map_err(PipelineError::Staging)?;

        let outcome = self
            .extractor
            .extract(&archive_path, &self.extract_options)
            .await?;
        Ok(outcome)
    }

    /// Validate and parse an XML upload in the sandbox.
    #[tracing::instrument(skip(self, file), fields(file_name = %file.name(), size = file.size_bytes))]
    pub async fn handle_xml_upload(
        &self,
        file: UploadedFile,
    ) -> Result<XmlUploadResult, PipelineError> {
        self.validate(&self.xml_validator, &file)?;
        self.signal
            .report(ChallengeKind::DeprecatedInterfaceUsed, &|| true);

        if self.safe_mode {
            return Ok(XmlUploadResult::Disabled);
        }

        let text = String::from_utf8_lossy(&file.content).into_owned();
        let result = match self.xml_parser.parse(text).await {
            Ok(document) => {
                let rendering = document.into_string();
                self.signal
                    .report(ChallengeKind::FileDisclosureViaExpansion, &|| {
                        self.detector.matches_any(&rendering)
                    });
                XmlUploadResult::Deprecated {
                    rendering: truncate(&rendering, RENDERING_LIMIT),
                }
            }
            Err(XmlParseError::Timeout { budget_ms }) => {
                tracing::warn!(budget_ms = budget_ms, "XML upload hit the parse budget");
                self.signal
                    .report(ChallengeKind::TimeoutDenialOfService, &|| true);
                XmlUploadResult::Timeout
            }
            Err(XmlParseError::Parse(message)) => {
                tracing::debug!(error = %message, "XML upload is malformed");
                XmlUploadResult::ParseFailed { message }
            }
        };

        Ok(result)
    }
}

/// Drop line breaks and cut to at most `max` characters, ending in `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    let flat: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    if flat.chars().count() <= max {
        return flat;
    }

    let keep = max.saturating_sub(3);
    let mut out: String = flat.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use intake_core::{ChallengeLedger, IntakeConfig};
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::{FileOptions, ZipWriter};

    struct Fixture {
        _dir: TempDir,
        pipeline: UploadPipeline,
        ledger: Arc<ChallengeLedger>,
        upload_dir: std::path::PathBuf,
        staging_dir: std::path::PathBuf,
    }

    fn fixture_with(customize: impl FnOnce(&mut IntakeConfig)) -> Fixture {
        let dir = TempDir::new().unwrap();
        let upload_dir = dir.path().join("uploads/complaints");
        let staging_dir = dir.path().join("staging");
        let mut inner = IntakeConfig {
            upload_dir: upload_dir.clone(),
            staging_dir: staging_dir.clone(),
            sentinel_path: dir.path().join("ftp/legal.md"),
            ..IntakeConfig::default()
        };
        customize(&mut inner);
        let ledger = Arc::new(ChallengeLedger::new());
        let pipeline = UploadPipeline::from_config(&Config::new(inner), ledger.clone()).unwrap();
        Fixture {
            _dir: dir,
            pipeline,
            ledger,
            upload_dir,
            staging_dir,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(|_| {})
    }

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Bytes {
        let mut buffer = Vec::new();
        {
            let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
            for (name, data) in entries {
                zip.start_file(*name, FileOptions::default()).unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        Bytes::from(buffer)
    }

    fn upload(name: &str, content: Bytes) -> UploadedFile {
        UploadedFile::new(Some(name.to_string()), "application/octet-stream", content)
    }

    fn staging_is_empty(fixture: &Fixture) -> bool {
        std::fs::read_dir(&fixture.staging_dir)
            .map(|entries| entries.count() == 0)
            .unwrap_or(true)
    }

    #[tokio::test]
    async fn test_zip_upload_extracts_and_releases() {
        let f = fixture();
        let content = zip_bytes(&[("complaint.txt", b"late"), ("nested/photo.jpg", b"jpg")]);

        let outcome = f
            .pipeline
            .handle_zip_upload(upload("complaint.zip", content))
            .await
            .unwrap();

        assert_eq!(outcome.succeeded_count, 2);
        assert!(f.upload_dir.join("complaint.txt").exists());
        assert!(f.upload_dir.join("photo.jpg").exists());
        assert_eq!(
            f.pipeline.staging_stats(),
            StagingStats {
                acquired: 1,
                released: 1
            }
        );
        assert!(staging_is_empty(&f));
    }

    #[tokio::test]
    async fn test_oversized_upload_never_stages() {
        let f = fixture();
        let content = Bytes::from(vec![0u8; 6 * 1024 * 1024]);

        let err = f
            .pipeline
            .handle_zip_upload(upload("big.zip", content))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::OversizedFile { .. })
        ));
        assert_eq!(f.pipeline.staging_stats().acquired, 0);
        assert!(staging_is_empty(&f));
        assert!(f.ledger.is_reported(ChallengeKind::OversizedUpload));
    }

    #[tokio::test]
    async fn test_disallowed_type_is_reported() {
        let f = fixture();
        let err = f
            .pipeline
            .handle_zip_upload(upload("payload.exe", Bytes::from_static(b"MZ")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::DisallowedExtension { .. })
        ));
        assert!(f.ledger.is_reported(ChallengeKind::DisallowedType));
    }

    #[tokio::test]
    async fn test_decode_failure_still_releases() {
        let f = fixture();
        let err = f
            .pipeline
            .handle_zip_upload(upload("broken.zip", Bytes::from_static(b"not a zip")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Extraction(ExtractError::DecodeFatal(_))
        ));
        assert_eq!(
            f.pipeline.staging_stats(),
            StagingStats {
                acquired: 1,
                released: 1
            }
        );
        assert!(staging_is_empty(&f));
    }

    #[tokio::test]
    async fn test_evil_zip_outcome() {
        let f = fixture();
        let content = zip_bytes(&[("../../etc/passwd", b"root:x:0:0::/:/bin/sh")]);

        let outcome = f
            .pipeline
            .handle_zip_upload(upload("evil.zip", content))
            .await
            .unwrap();

        assert_eq!(outcome.succeeded_count, 0);
        assert_eq!(outcome.failed_entries.len(), 1);
        assert_eq!(std::fs::read_dir(&f.upload_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_safe_mode_disables_both_flows() {
        let f = fixture_with(|c| c.safe_mode = true);

        let err = f
            .pipeline
            .handle_zip_upload(upload("a.zip", zip_bytes(&[("a.txt", b"a")])))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Disabled));
        assert_eq!(f.pipeline.staging_stats().acquired, 0);

        let result = f
            .pipeline
            .handle_xml_upload(upload("a.xml", Bytes::from_static(b"<a/>")))
            .await
            .unwrap();
        assert_eq!(result, XmlUploadResult::Disabled);
        assert!(f.ledger.is_reported(ChallengeKind::DeprecatedInterfaceUsed));
    }

    #[tokio::test]
    async fn test_xml_upload_renders_truncated_document() {
        let f = fixture();
        let body = "x".repeat(1000);
        let xml = format!("<complaint>{}</complaint>", body);

        let result = f
            .pipeline
            .handle_xml_upload(upload("complaint.xml", Bytes::from(xml)))
            .await
            .unwrap();

        let XmlUploadResult::Deprecated { rendering } = &result else {
            panic!("expected deprecation, got {result:?}");
        };
        assert_eq!(rendering.chars().count(), RENDERING_LIMIT);
        assert!(rendering.starts_with("<?xml version=\"1.0\"?><complaint>"));
        assert!(rendering.ends_with("..."));
        assert!(result
            .client_message("complaint.xml")
            .ends_with("... (complaint.xml)"));
        assert!(f.ledger.is_reported(ChallengeKind::DeprecatedInterfaceUsed));
        assert!(!f.ledger.is_reported(ChallengeKind::FileDisclosureViaExpansion));
    }

    #[tokio::test]
    async fn test_xml_self_reference_is_timeout() {
        let f = fixture();
        let xml = r#"<!DOCTYPE c [<!ENTITY a "&a;&a;">]><c>&a;</c>"#;

        let result = f
            .pipeline
            .handle_xml_upload(upload("dos.xml", Bytes::from_static(xml.as_bytes())))
            .await
            .unwrap();

        assert_eq!(result, XmlUploadResult::Timeout);
        assert!(f.ledger.is_reported(ChallengeKind::TimeoutDenialOfService));
        assert_eq!(
            result.client_message("dos.xml"),
            "Sorry, we are temporarily not available! Please try again later."
        );
    }

    #[tokio::test]
    async fn test_xml_disclosure_detected_in_rendering() {
        let f = fixture();
        let xml = "<c>root:x:0:0:root:/root:/bin/bash\nbin:x:1:1:bin:/bin:/sbin/nologin</c>";

        f.pipeline
            .handle_xml_upload(upload("leak.xml", Bytes::from_static(xml.as_bytes())))
            .await
            .unwrap();

        assert!(f.ledger.is_reported(ChallengeKind::FileDisclosureViaExpansion));
    }

    #[tokio::test]
    async fn test_xml_requires_xml_extension() {
        let f = fixture();
        let err = f
            .pipeline
            .handle_xml_upload(upload("complaint.txt", Bytes::from_static(b"<a/>")))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::DisallowedExtension { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_xml_is_parse_failure() {
        let f = fixture();
        let result = f
            .pipeline
            .handle_xml_upload(upload("bad.xml", Bytes::from_static(b"<a><b></a>")))
            .await
            .unwrap();
        assert!(matches!(result, XmlUploadResult::ParseFailed { .. }));
        assert!(result.client_message("bad.xml").starts_with(DEPRECATION_PREFIX));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 400), "short");
        assert_eq!(truncate("a\nb\r\nc", 400), "abc");
        let long = "é".repeat(500);
        let cut = truncate(&long, 400);
        assert_eq!(cut.chars().count(), 400);
        assert!(cut.ends_with("..."));
    }
}
