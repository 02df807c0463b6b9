//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_api;

use std::path::PathBuf;
use std::time::Duration;

use campus_portal::fetch::HttpTransport;
use reqwest::Url;
use tempfile::TempDir;

/// Transport pointed at a mock server, with short timeouts.
pub fn transport(base_url: &str) -> HttpTransport {
    let base = Url::parse(base_url).expect("mock base url");
    HttpTransport::new(base, Duration::from_secs(2), Duration::from_secs(1)).expect("http client")
}

/// Write `content` to a `config.toml` in a fresh temp dir.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}
