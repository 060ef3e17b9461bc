//! API constants

/// Versioned API prefix. Handler path annotations repeat it as a literal.
pub const API_PREFIX: &str = "/api/v0";

/// The hard request body cap is this multiple of the upload size limit, so
/// bodies just over the limit still reach the validator and get a reason code.
pub const BODY_LIMIT_FACTOR: usize = 2;

/// Room for multipart boundaries and part headers on top of the file itself
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;
