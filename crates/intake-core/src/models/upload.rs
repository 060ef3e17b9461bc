use bytes::Bytes;

/// A file received from a multipart upload.
///
/// Owned by the request that received it and dropped once the pipeline
/// completes or fails.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied file name; untrusted and possibly absent
    pub original_name: Option<String>,
    pub mime_type: String,
    pub size_bytes: usize,
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(original_name: Option<String>, mime_type: impl Into<String>, content: Bytes) -> Self {
        Self {
            original_name,
            mime_type: mime_type.into(),
            size_bytes: content.len(),
            content,
        }
    }

    /// File name, or an empty string when the client sent none
    pub fn name(&self) -> &str {
        self.original_name.as_deref().unwrap_or("")
    }

    /// Lowercased extension after the last `.`, if any
    pub fn extension(&self) -> Option<String> {
        let name = self.name();
        name.rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
    }
}
