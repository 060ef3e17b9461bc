use intake_core::{ChallengeKind, UploadedFile};

/// Upload validation errors, in the order the checks run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid file")]
    MissingFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    OversizedFile { size: usize, max: usize },

    #[error("Invalid file type: {extension} (allowed: {allowed:?})")]
    DisallowedExtension {
        extension: String,
        allowed: Vec<String>,
    },
}

impl ValidationError {
    /// Machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingFile => "MISSING_FILE",
            ValidationError::OversizedFile { .. } => "OVERSIZED_FILE",
            ValidationError::DisallowedExtension { .. } => "DISALLOWED_EXTENSION",
        }
    }

    /// Challenge reported when this rejection happens, if any
    pub fn challenge_kind(&self) -> Option<ChallengeKind> {
        match self {
            ValidationError::MissingFile => None,
            ValidationError::OversizedFile { .. } => Some(ChallengeKind::OversizedUpload),
            ValidationError::DisallowedExtension { .. } => Some(ChallengeKind::DisallowedType),
        }
    }
}

/// Size and extension constraints for an upload endpoint
#[derive(Debug, Clone)]
pub struct UploadRules {
    /// Lowercase extensions without the leading dot
    pub allowed_extensions: Vec<String>,
    pub max_size_bytes: usize,
}

impl Default for UploadRules {
    fn default() -> Self {
        Self {
            allowed_extensions: vec!["zip".to_string()],
            max_size_bytes: 5 * 1024 * 1024,
        }
    }
}

impl UploadRules {
    pub fn new(allowed_extensions: &[String], max_size_bytes: usize) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            max_size_bytes,
        }
    }
}

/// Upload validator
///
/// Runs before anything touches the filesystem. Checks short-circuit on the
/// first failure: file name present, size within the limit, extension allowed.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    rules: UploadRules,
}

impl UploadValidator {
    pub fn new(rules: UploadRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &UploadRules {
        &self.rules
    }

    pub fn validate(&self, file: &UploadedFile) -> Result<(), ValidationError> {
        if file.name().trim().is_empty() {
            return Err(ValidationError::MissingFile);
        }

        self.validate_file_size(file.size_bytes)?;
        self.validate_extension(file.name())
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.rules.max_size_bytes {
            return Err(ValidationError::OversizedFile {
                size,
                max: self.rules.max_size_bytes,
            });
        }

        Ok(())
    }

    /// Validate file extension (substring after the last `.`, case-insensitive)
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        if extension.is_empty() || !self.rules.allowed_extensions.contains(&extension) {
            return Err(ValidationError::DisallowedExtension {
                extension,
                allowed: self.rules.allowed_extensions.clone(),
            });
        }

        Ok(())
    }
}
