//! Test helpers: build AppState and router for integration tests.
//!
//! Every test app owns a temporary directory holding its upload, staging and
//! sentinel paths, so tests run in parallel without sharing files.

pub mod fixtures;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use intake_api::constants;
use intake_api::setup::routes;
use intake_api::state::AppState;
use intake_core::{ChallengeKind, ChallengeSignal, Config, IntakeConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub upload_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    pub fn is_reported(&self, kind: ChallengeKind) -> bool {
        self.state.ledger.is_reported(kind)
    }

    /// POST a single `file` part to `path`.
    pub async fn upload(&self, path: &str, file_name: &str, content: Vec<u8>) -> TestResponse {
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(content)
                .file_name(file_name)
                .mime_type("application/octet-stream"),
        );
        self.server.post(&api_path(path)).multipart(form).await
    }
}

/// Setup test app with default limits.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_, _| {}).await
}

/// Setup test app, letting the caller adjust the configuration.
pub async fn setup_test_app_with(customize: impl FnOnce(&mut IntakeConfig, &Path)) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let mut inner = IntakeConfig {
        upload_dir: root.join("uploads/complaints"),
        staging_dir: root.join("staging"),
        sentinel_path: root.join("ftp/legal.md"),
        ..IntakeConfig::default()
    };
    customize(&mut inner, root);

    let config = Config::new(inner);
    let state = Arc::new(AppState::new(config.clone()).expect("Failed to build app state"));
    let upload_dir = state.pipeline.extractor().guard().base_dir().to_path_buf();
    let router = routes::setup_routes(&config, state.clone());
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        upload_dir,
        _temp_dir: temp_dir,
    }
}
