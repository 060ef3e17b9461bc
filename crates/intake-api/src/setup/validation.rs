//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use intake_core::Config;

/// Validate critical configuration values
///
/// Runs the value checks of [`Config::validate`] and then the checks that
/// relate several settings to each other.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    // Staged archives must never be reachable through the complaint download route.
    if config.staging_dir().starts_with(config.upload_dir()) {
        return Err(anyhow::anyhow!(
            "STAGING_DIR ({}) must not be inside UPLOAD_DIR ({})",
            config.staging_dir().display(),
            config.upload_dir().display()
        ));
    }

    if !sentinel_reachable(config) {
        tracing::warn!(
            sentinel = %config.sentinel_path().display(),
            upload_dir = %config.upload_dir().display(),
            "SENTINEL_PATH lies outside UPLOAD_DIR; archive entries can never be written there, \
             so unexpected zip path writes will not be reported"
        );
    }

    let is_production = config.is_production();
    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if is_production && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if is_production && !config.safe_mode() {
        tracing::warn!("SAFE_MODE is off in production; archive and XML uploads are processed");
    }

    Ok(())
}

/// Whether an extracted archive entry can ever land on the sentinel. Entries
/// are confined to the upload directory, so the sentinel must lie beneath it.
fn sentinel_reachable(config: &Config) -> bool {
    config.sentinel_path().starts_with(config.upload_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::IntakeConfig;
    use std::path::PathBuf;

    fn config(upload_dir: &str, staging_dir: &str) -> Config {
        Config::new(IntakeConfig {
            upload_dir: PathBuf::from(upload_dir),
            staging_dir: PathBuf::from(staging_dir),
            ..IntakeConfig::default()
        })
    }

    #[test]
    fn test_separate_directories_pass() {
        assert!(validate_config(&config("uploads/complaints", "/tmp/intake")).is_ok());
    }

    #[test]
    fn test_staging_inside_upload_dir_rejected() {
        let err = validate_config(&config("uploads/complaints", "uploads/complaints/tmp"))
            .unwrap_err();
        assert!(err.to_string().contains("STAGING_DIR"));
    }

    #[test]
    fn test_zero_upload_size_rejected() {
        let inner = IntakeConfig {
            max_upload_size_bytes: 0,
            ..IntakeConfig::default()
        };
        assert!(validate_config(&Config::new(inner)).is_err());
    }

    #[test]
    fn test_default_sentinel_is_unreachable() {
        let config = Config::new(IntakeConfig::default());
        assert!(!sentinel_reachable(&config));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_sentinel_under_upload_dir_is_reachable() {
        let config = Config::new(IntakeConfig {
            sentinel_path: PathBuf::from("uploads/complaints/legal.md"),
            ..IntakeConfig::default()
        });
        assert!(sentinel_reachable(&config));
    }
}
