//! The authenticated HTTP client.
//!
//! Attaches the current access token to every request. A 401 on a first
//! attempt is handed to the [`RefreshCoordinator`] together with a replay
//! closure; the replay is marked `retried`, so a second 401 ends the
//! request with `RetryExhausted` instead of refreshing again.

use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use authwire_auth::refresh::{RefreshCoordinator, Replay};
use authwire_auth::token::TokenStore;
use authwire_core::config::ClientConfig;
use authwire_core::error::AppError;
use authwire_core::result::AppResult;
use authwire_core::traits::Transport;
use authwire_core::types::request::OutboundRequest;
use authwire_core::types::{ApiEnvelope, ApiResponse, Method, RequestSpec};

#[derive(Debug)]
struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<TokenStore>,
    coordinator: RefreshCoordinator,
}

/// Authenticated client. Clones share the same store and coordinator.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

impl HttpClient {
    /// Creates a client.
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<TokenStore>,
        coordinator: RefreshCoordinator,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                store,
                coordinator,
            }),
        }
    }

    /// Client settings.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Sends `spec` with the current access token.
    ///
    /// Non-401 statuses are returned as responses. A first-attempt 401 is
    /// resolved transparently through a refresh when possible.
    ///
    /// # Errors
    ///
    /// - `AuthExpired` if the server rejected the request and there is no
    ///   session to refresh.
    /// - `RefreshFailed` if the refresh endpoint failed.
    /// - `RetryExhausted` if the request was rejected again after its retry.
    /// - `Network` for transport failures.
    pub async fn request(&self, spec: RequestSpec) -> AppResult<ApiResponse> {
        let access_token = self.inner.store.access_token();
        let response = self.send(&spec, access_token.as_deref()).await?;

        if !response.is_unauthorized() {
            return Ok(response);
        }

        if spec.retried {
            warn!(method = %spec.method, path = %spec.path, "Request rejected after retry");
            return Err(retry_exhausted(&spec));
        }

        debug!(method = %spec.method, path = %spec.path, "Request unauthorized; deferring to refresh");

        let client = self.clone();
        let mut retry = spec;
        retry.retried = true;
        let replay: Replay = Box::new(move |access_token: String| {
            async move {
                let response = client.send(&retry, Some(&access_token)).await?;
                if response.is_unauthorized() {
                    warn!(method = %retry.method, path = %retry.path, "Replayed request rejected");
                    return Err(retry_exhausted(&retry));
                }
                Ok(response)
            }
            .boxed()
        });

        self.inner
            .coordinator
            .on_unauthorized(access_token.as_deref(), replay)
            .await
    }

    /// Sends a request built from its parts.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        headers: Vec<(String, String)>,
    ) -> AppResult<ApiResponse> {
        let mut spec = RequestSpec::new(method, path);
        spec.body = body;
        spec.headers = headers;
        self.request(spec).await
    }

    /// `GET` decoding the response envelope.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self.request(RequestSpec::get(path)).await?;
        decode(&response)
    }

    /// `POST` a JSON body, decoding the response envelope.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let response = self.request(RequestSpec::post(path).json(body)?).await?;
        decode(&response)
    }

    /// Sends `spec` without credentials and without refresh handling.
    pub async fn send_anonymous(&self, spec: &RequestSpec) -> AppResult<ApiResponse> {
        self.send(spec, None).await
    }

    /// Builds and sends one attempt.
    async fn send(&self, spec: &RequestSpec, access_token: Option<&str>) -> AppResult<ApiResponse> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        headers.extend(
            spec.headers
                .iter()
                .filter(|(name, _)| {
                    !name.eq_ignore_ascii_case("authorization")
                        && !name.eq_ignore_ascii_case("content-type")
                })
                .cloned(),
        );
        if let Some(token) = access_token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let request = OutboundRequest {
            method: spec.method,
            url: self.inner.config.url_for(&spec.path),
            headers,
            body: spec.body.clone(),
        };
        self.inner.transport.send(request).await
    }
}

fn retry_exhausted(spec: &RequestSpec) -> AppError {
    AppError::retry_exhausted(format!(
        "{} {} was rejected again after refreshing the session",
        spec.method, spec.path
    ))
}

/// Decodes a 2xx response envelope; other statuses become errors carrying
/// the server's message when it sent one.
pub(crate) fn decode<T: DeserializeOwned>(response: &ApiResponse) -> AppResult<T> {
    if !response.is_success() {
        return Err(status_error(response));
    }
    ApiEnvelope::decode(&response.body)
}

/// An error describing a non-2xx response.
pub(crate) fn status_error(response: &ApiResponse) -> AppError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    let detail = response
        .json::<ErrorBody>()
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| response.text());
    let message = format!("Server returned {}: {detail}", response.status);
    match response.status {
        400 | 422 => AppError::validation(message),
        401 | 403 => AppError::authentication(message),
        _ => AppError::internal(message),
    }
}
