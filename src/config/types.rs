use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base address every request path is appended to (e.g., "http://127.0.0.1:8000").
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Connection timeout in seconds. Unset means the transport default.
    #[serde(default)]
    pub connect_timeout_seconds: Option<u32>,
}

/// Session marker and display-name persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie whose presence marks a possible server session (default: "token").
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// File holding the signed-in display name.
    /// Defaults to `<data_dir>/docindex/docindex.auth.user`.
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

/// Document list and upload settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Rows per page when the shell starts (default: 10).
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Page sizes the shell offers.
    #[serde(default = "default_page_size_options")]
    pub page_size_options: Vec<u32>,
    /// Largest accepted upload in bytes (default: 40 MiB).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Use the server-paginated list instead of `/document/all`.
    #[serde(default = "default_paginated")]
    pub paginated: bool,
}

/// Query cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds an unobserved entry survives before it may be collected.
    #[serde(default = "default_gc_after_seconds")]
    pub gc_after_seconds: u64,
}

/// Name of the durable display-name value.
pub const DISPLAY_NAME_KEY: &str = "docindex.auth.user";

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_cookie_name() -> String {
    "token".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_page_size_options() -> Vec<u32> {
    vec![10, 20, 50, 100]
}

fn default_max_upload_bytes() -> u64 {
    40 * 1024 * 1024
}

fn default_paginated() -> bool {
    true
}

fn default_gc_after_seconds() -> u64 {
    300
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_seconds: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            storage_path: None,
        }
    }
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            page_size_options: default_page_size_options(),
            max_upload_bytes: default_max_upload_bytes(),
            paginated: default_paginated(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            gc_after_seconds: default_gc_after_seconds(),
        }
    }
}

impl SessionConfig {
    /// Resolved location of the display-name file.
    pub fn resolved_storage_path(&self) -> PathBuf {
        match &self.storage_path {
            Some(path) => path.clone(),
            None => {
                let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
                data_dir.join("docindex").join(DISPLAY_NAME_KEY)
            }
        }
    }
}
