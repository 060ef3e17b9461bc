//! Intake Processing Library
//!
//! This crate provides the upload processing pipeline: path containment,
//! per-request staging, upload validation, streaming archive extraction and
//! sandboxed XML parsing.

pub mod extract;
pub mod path_guard;
pub mod pipeline;
pub mod staging;
pub mod validator;
pub mod xml;

pub use extract::{
    ArchiveExtractor, ExtractError, ExtractOptions, ExtractionOutcome, FailedEntry, FailureReason,
};
pub use path_guard::{PathGuard, PathGuardError, ResolvedDestination};
pub use pipeline::{truncate, PipelineError, UploadPipeline, XmlUploadResult};
pub use staging::{StagingHandle, StagingStats, TempStaging};
pub use validator::{UploadRules, UploadValidator, ValidationError};
pub use xml::{
    DisclosureDetector, ParsedDocument, SandboxedXmlParser, XmlParseError, XmlParseOptions,
};
