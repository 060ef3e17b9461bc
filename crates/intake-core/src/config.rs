//! Configuration module
//!
//! This module provides configuration structures for the upload service,
//! including server, upload/extraction limits and the sandboxed XML parser budget.
//! Configuration is read once at startup and shared immutably.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_UPLOAD_SIZE_BYTES: usize = 5 * 1024 * 1024;
const MAX_ARCHIVE_ENTRIES: usize = 10_000;
const XML_PARSE_TIMEOUT_MS: u64 = 2000;
const MAX_XML_PARSE_TIMEOUT_MS: u64 = 600_000;
const XML_MAX_ENTITY_DEPTH: usize = 64;
const XML_MAX_EXPANDED_BYTES: usize = 16 * 1024 * 1024;
const DEFAULT_UPLOAD_DIR: &str = "uploads/complaints";
const DEFAULT_SENTINEL_PATH: &str = "ftp/legal.md";

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Base configuration shared by every entry point
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub log_format: LogFormat,
    pub service_name: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            log_format: LogFormat::Text,
            service_name: "intake-api".to_string(),
        }
    }
}

/// Upload, extraction and XML parsing configuration
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub base: BaseConfig,
    /// Directory archive entries are extracted into
    pub upload_dir: PathBuf,
    /// Root under which per-request staging directories are created
    pub staging_dir: PathBuf,
    pub allowed_extensions: Vec<String>,
    pub max_upload_size_bytes: usize,
    pub preserve_archive_paths: bool,
    pub max_archive_entries: usize,
    pub xml_parse_timeout_ms: u64,
    pub xml_max_entity_depth: usize,
    pub xml_max_expanded_bytes: usize,
    /// Destination whose write is reported as an unexpected zip path write
    pub sentinel_path: PathBuf,
    /// Disables archive extraction and XML parsing (containerised deployments)
    pub safe_mode: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            staging_dir: env::temp_dir(),
            allowed_extensions: vec!["zip".to_string()],
            max_upload_size_bytes: MAX_UPLOAD_SIZE_BYTES,
            preserve_archive_paths: false,
            max_archive_entries: MAX_ARCHIVE_ENTRIES,
            xml_parse_timeout_ms: XML_PARSE_TIMEOUT_MS,
            xml_max_entity_depth: XML_MAX_ENTITY_DEPTH,
            xml_max_expanded_bytes: XML_MAX_EXPANDED_BYTES,
            sentinel_path: PathBuf::from(DEFAULT_SENTINEL_PATH),
            safe_mode: false,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IntakeConfig>);

impl Config {
    pub fn new(config: IntakeConfig) -> Self {
        Config(Box::new(config))
    }

    fn inner(&self) -> &IntakeConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.inner().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IntakeConfig::from_env()?;
        Ok(Config::new(config))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> LogFormat {
        self.inner().base.log_format
    }

    pub fn service_name(&self) -> &str {
        &self.inner().base.service_name
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.inner().upload_dir
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.inner().staging_dir
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn preserve_archive_paths(&self) -> bool {
        self.inner().preserve_archive_paths
    }

    pub fn max_archive_entries(&self) -> usize {
        self.inner().max_archive_entries
    }

    pub fn xml_parse_timeout(&self) -> Duration {
        Duration::from_millis(self.inner().xml_parse_timeout_ms)
    }

    pub fn xml_max_entity_depth(&self) -> usize {
        self.inner().xml_max_entity_depth
    }

    pub fn xml_max_expanded_bytes(&self) -> usize {
        self.inner().xml_max_expanded_bytes
    }

    pub fn sentinel_path(&self) -> &PathBuf {
        &self.inner().sentinel_path
    }

    pub fn safe_mode(&self) -> bool {
        self.inner().safe_mode
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_bool(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl IntakeConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let log_format = match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "text".to_string())
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            log_format,
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "intake-api".to_string()),
        };

        let config = IntakeConfig {
            base,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            staging_dir: env::var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir()),
            allowed_extensions: parse_extensions(
                &env::var("ALLOWED_EXTENSIONS").unwrap_or_else(|_| "zip".to_string()),
            ),
            max_upload_size_bytes: env::var("MAX_UPLOAD_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_UPLOAD_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_UPLOAD_SIZE_BYTES),
            preserve_archive_paths: env::var("PRESERVE_ARCHIVE_PATHS")
                .map(|v| parse_bool(&v, false))
                .unwrap_or(false),
            max_archive_entries: env::var("MAX_ARCHIVE_ENTRIES")
                .unwrap_or_else(|_| MAX_ARCHIVE_ENTRIES.to_string())
                .parse()
                .unwrap_or(MAX_ARCHIVE_ENTRIES),
            xml_parse_timeout_ms: env::var("XML_PARSE_TIMEOUT_MS")
                .unwrap_or_else(|_| XML_PARSE_TIMEOUT_MS.to_string())
                .parse()
                .unwrap_or(XML_PARSE_TIMEOUT_MS),
            xml_max_entity_depth: env::var("XML_MAX_ENTITY_DEPTH")
                .unwrap_or_else(|_| XML_MAX_ENTITY_DEPTH.to_string())
                .parse()
                .unwrap_or(XML_MAX_ENTITY_DEPTH),
            xml_max_expanded_bytes: env::var("XML_MAX_EXPANDED_BYTES")
                .unwrap_or_else(|_| XML_MAX_EXPANDED_BYTES.to_string())
                .parse()
                .unwrap_or(XML_MAX_EXPANDED_BYTES),
            sentinel_path: env::var("SENTINEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SENTINEL_PATH)),
            safe_mode: env::var("SAFE_MODE")
                .map(|v| parse_bool(&v, false))
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_BYTES must be greater than 0"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_EXTENSIONS must list at least one extension"
            ));
        }

        if self.xml_parse_timeout_ms == 0 {
            return Err(anyhow::anyhow!("XML_PARSE_TIMEOUT_MS must be greater than 0"));
        }

        if self.xml_parse_timeout_ms > MAX_XML_PARSE_TIMEOUT_MS {
            return Err(anyhow::anyhow!(
                "XML_PARSE_TIMEOUT_MS must not exceed {}",
                MAX_XML_PARSE_TIMEOUT_MS
            ));
        }

        if self.xml_max_entity_depth == 0 || self.xml_max_expanded_bytes == 0 {
            return Err(anyhow::anyhow!(
                "XML_MAX_ENTITY_DEPTH and XML_MAX_EXPANDED_BYTES must be greater than 0"
            ));
        }

        if self.max_archive_entries == 0 {
            return Err(anyhow::anyhow!("MAX_ARCHIVE_ENTRIES must be greater than 0"));
        }

        if self.upload_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_DIR must not be empty"));
        }

        Ok(())
    }
}
