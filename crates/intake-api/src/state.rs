//! Application state shared by all handlers.

use intake_core::{ChallengeLedger, Config};
use intake_processing::UploadPipeline;
use std::sync::Arc;

/// Main application state: configuration, the upload pipeline and the challenge ledger.
pub struct AppState {
    pub config: Config,
    pub pipeline: UploadPipeline,
    pub ledger: Arc<ChallengeLedger>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let ledger = Arc::new(ChallengeLedger::new());
        let pipeline = UploadPipeline::from_config(&config, ledger.clone())?;

        Ok(Self {
            config,
            pipeline,
            ledger,
        })
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
