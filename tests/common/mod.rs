//! Shared test utilities.

#![allow(dead_code, unused_imports)]

pub mod mock_backend;

use docindex::client::DocumentClient;
use docindex::config::Config;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Config pointing at `base_url`, with the display name stored under `dir`.
pub fn test_config(base_url: &str, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    config.session.storage_path = Some(display_name_path(dir));
    config.documents.max_upload_bytes = 1024;
    config
}

pub fn display_name_path(dir: &TempDir) -> PathBuf {
    dir.path().join("docindex.auth.user")
}

/// Client wired the way the binary wires it.
pub fn make_client(base_url: &str) -> (DocumentClient, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let client = DocumentClient::from_config(&test_config(base_url, &dir))
        .expect("Failed to build client");
    (client, dir)
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
