//! Minimal Landlock sandbox setup for Linux.
//!
//! This is a best-effort hardening layer: if Landlock is unavailable or setup
//! fails (e.g. older kernel, missing permissions), we log and continue without
//! sandboxing rather than crashing the service.

#[cfg(target_os = "linux")]
pub mod linux {
    use intake_core::Config;
    use landlock::{
        path_beneath_rules, Access, AccessFs, Ruleset, RulesetAttr, RulesetCreatedAttr,
        RulesetStatus, ABI,
    };
    use tracing::{info, warn};

    /// Initialize a minimal Landlock sandbox.
    ///
    /// Current policy:
    /// - Allow read-only access to the working directory (sentinel files, static content)
    /// - Allow read-write access to the upload and staging directories
    /// - Deny everything else
    pub fn init(config: &Config) {
        // The Landlock ABI should be incremented (and tested) regularly.
        let abi = ABI::V1;
        let access_all = AccessFs::from_all(abi);
        let access_read = AccessFs::from_read(abi);
        let writable = [config.upload_dir(), config.staging_dir()];

        let ruleset = Ruleset::default();
        let result = ruleset
            .handle_access(access_all)
            .and_then(|r| r.create())
            .and_then(|r| r.add_rules(path_beneath_rules(&["."], access_read)))
            .and_then(|r| r.add_rules(path_beneath_rules(&writable, access_all)))
            .and_then(|r| r.restrict_self());

        match result {
            Ok(status) => match status.ruleset {
                RulesetStatus::FullyEnforced => info!(
                    ?status,
                    upload_dir = %config.upload_dir().display(),
                    staging_dir = %config.staging_dir().display(),
                    "Landlock sandbox fully enforced"
                ),
                RulesetStatus::PartiallyEnforced => info!(
                    ?status,
                    upload_dir = %config.upload_dir().display(),
                    staging_dir = %config.staging_dir().display(),
                    "Landlock sandbox partially enforced"
                ),
                RulesetStatus::NotEnforced => {
                    warn!(
                        ?status,
                        "Landlock ruleset not enforced; kernel does not support requested features"
                    );
                }
            },
            Err(err) => {
                warn!(?err, "Landlock not enabled; continuing without sandbox");
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub mod linux {
    use intake_core::Config;

    /// No-op on non-Linux targets.
    pub fn init(_config: &Config) {}
}
