//! HTTP gateway to the document API.
//!
//! Every request goes to a fixed base address, carries the session cookies
//! held in a shared jar, and comes back classified: transport failures become
//! [`ErrorOrigin::Network`](crate::outcome::ErrorOrigin::Network), non-success
//! statuses become `HttpStatus` with the server's `detail` message. No
//! retries and no caching happen here.

mod request;

pub use request::{ApiRequest, FilePart, RequestBody};

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::Instrument;

use crate::config::ApiConfig;
use crate::outcome::{ErrorInfo, Outcome};

/// Errors building the gateway itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid API base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Shared HTTP client bound to one API base address.
#[derive(Clone)]
pub struct ApiGateway {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl ApiGateway {
    pub fn new(config: &ApiConfig) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| GatewayError::InvalidBaseUrl {
            url: config.base_url.clone(),
            source: e,
        })?;

        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder().cookie_provider(Arc::clone(&jar));
        if let Some(seconds) = config.connect_timeout_seconds {
            builder = builder.connect_timeout(Duration::from_secs(u64::from(seconds)));
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            jar,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cookie jar shared with every request this gateway sends.
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.jar)
    }

    /// Absolute URL for `path` plus encoded query parameters.
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> Outcome<Url> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&joined)
            .map_err(|e| ErrorInfo::network(format!("Invalid request URL '{}': {}", joined, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    /// Send `req` and decode a JSON success body into `T`.
    pub async fn request<T: DeserializeOwned>(&self, req: ApiRequest) -> Outcome<T> {
        let (status, body) = self.send(req).await?;
        serde_json::from_slice(&body).map_err(|e| {
            ErrorInfo::http(status.as_u16(), format!("Malformed response body: {}", e))
        })
    }

    /// Send `req` and ignore whatever success body comes back.
    pub async fn execute(&self, req: ApiRequest) -> Outcome<()> {
        self.send(req).await.map(|_| ())
    }

    /// Fetch raw bytes from an absolute resource locator.
    pub async fn download(&self, url: &str) -> Outcome<Vec<u8>> {
        let url = Url::parse(url)
            .map_err(|e| ErrorInfo::network(format!("Invalid download URL '{}': {}", url, e)))?;
        let span = tracing::debug_span!(
            "download",
            url = %url,
            request_id = %uuid::Uuid::new_v4()
        );
        async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ErrorInfo::network(e.to_string()))?;
            let (_, body) = classify(response).await?;
            Ok(body)
        }
        .instrument(span)
        .await
    }

    async fn send(&self, req: ApiRequest) -> Outcome<(StatusCode, Vec<u8>)> {
        let span = tracing::debug_span!(
            "api_request",
            method = %req.method,
            path = %req.path,
            request_id = %uuid::Uuid::new_v4()
        );
        async move {
            let url = self.url_for(&req.path, &req.query)?;
            let mut builder = self.client.request(req.method, url);

            builder = match req.body {
                RequestBody::Empty => builder,
                RequestBody::Json(value) => builder.json(&value),
                RequestBody::File(file) => {
                    let part = Part::bytes(file.bytes).file_name(file.file_name);
                    builder.multipart(Form::new().part("file", part))
                }
            };

            let response = builder.send().await.map_err(|e| {
                tracing::warn!(error = %e, "Request failed before a response arrived");
                ErrorInfo::network(e.to_string())
            })?;
            classify(response).await
        }
        .instrument(span)
        .await
    }
}

async fn classify(response: reqwest::Response) -> Outcome<(StatusCode, Vec<u8>)> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| ErrorInfo::network(format!("Failed to read response body: {}", e)))?
        .to_vec();

    if status.is_success() {
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Response received");
        return Ok((status, body));
    }

    let err = error_from_body(status, &body);
    tracing::warn!(status = status.as_u16(), message = %err.message, "Request rejected");
    Err(err)
}

/// Surface a string `detail` verbatim, anything else as a generic message.
fn error_from_body(status: StatusCode, body: &[u8]) -> ErrorInfo {
    let detail = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| match parsed.detail {
            serde_json::Value::String(message) => Some(message),
            _ => None,
        });

    match detail {
        Some(message) => ErrorInfo::http(status.as_u16(), message),
        None => ErrorInfo::http(
            status.as_u16(),
            format!("Request failed with status {}", status.as_u16()),
        ),
    }
}
