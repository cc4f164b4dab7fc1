use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;

/// Answers "is there possibly a server session?".
///
/// Only the presence of the marker matters, never its value.
pub trait SessionMarker: Send + Sync {
    fn is_present(&self) -> bool;
}

/// Looks for a named cookie in the gateway's jar for the API origin.
pub struct CookieJarMarker {
    jar: Arc<Jar>,
    url: Url,
    cookie_name: String,
}

impl CookieJarMarker {
    pub fn new(jar: Arc<Jar>, url: Url, cookie_name: impl Into<String>) -> Self {
        Self {
            jar,
            url,
            cookie_name: cookie_name.into(),
        }
    }
}

impl SessionMarker for CookieJarMarker {
    fn is_present(&self) -> bool {
        let Some(header) = self.jar.cookies(&self.url) else {
            return false;
        };
        let Ok(cookies) = header.to_str() else {
            return false;
        };
        cookie_header_contains(cookies, &self.cookie_name)
    }
}

/// Fixed answer, for wiring without a cookie jar.
#[derive(Debug, Clone, Copy)]
pub struct StaticMarker(pub bool);

impl SessionMarker for StaticMarker {
    fn is_present(&self) -> bool {
        self.0
    }
}

fn cookie_header_contains(header: &str, name: &str) -> bool {
    header
        .split(';')
        .map(str::trim)
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key == name && !value.is_empty())
}
