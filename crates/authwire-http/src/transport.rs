//! `reqwest` transport.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use authwire_core::config::ClientConfig;
use authwire_core::error::{AppError, ErrorKind};
use authwire_core::result::AppResult;
use authwire_core::traits::Transport;
use authwire_core::types::request::OutboundRequest;
use authwire_core::types::{ApiResponse, Method};

/// Sends requests with a pooled `reqwest::Client`.
///
/// Every HTTP status is returned as a response; only connection, timeout,
/// and body-read failures become `Network` errors.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with the configured timeout and user agent.
    pub fn new(config: &ClientConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build HTTP client",
                    e,
                )
            })?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> AppResult<ApiResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(network_error)?;

        debug!(
            method = %request.method,
            url = %request.url,
            status,
            "HTTP request completed"
        );

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Maps a `reqwest` failure to a `Network` error.
fn network_error(err: reqwest::Error) -> AppError {
    let message = if err.is_timeout() {
        "Request timed out".to_string()
    } else if err.is_connect() {
        format!("Connection failed: {err}")
    } else {
        format!("HTTP transport error: {err}")
    };
    AppError::with_source(ErrorKind::Network, message, err)
}
