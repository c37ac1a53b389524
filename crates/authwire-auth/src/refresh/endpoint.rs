//! The refresh endpoint protocol.
//!
//! `POST {refresh_path}` with `{"refreshToken": "..."}` and no bearer
//! header. The server answers with a new access token, either wrapped
//! (`{"success": true, "data": {"accessToken": ...}}`) or flat
//! (`{"accessToken": ...}`), and may rotate the refresh token.

use std::sync::Arc;

use serde::Deserialize;

use authwire_core::config::ClientConfig;
use authwire_core::error::{AppError, ErrorKind};
use authwire_core::result::AppResult;
use authwire_core::traits::Transport;
use authwire_core::types::ApiEnvelope;
use authwire_core::types::Method;
use authwire_core::types::request::OutboundRequest;

/// Tokens issued by a successful refresh.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshGrant {
    /// New access token.
    #[serde(alias = "access_token")]
    pub access_token: String,
    /// Rotated refresh token, if the server issued one.
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for RefreshGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshGrant")
            .field("rotated", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Client for the refresh endpoint.
#[derive(Debug, Clone)]
pub struct RefreshEndpoint {
    /// Transport shared with the authenticated client.
    transport: Arc<dyn Transport>,
    /// Absolute refresh URL.
    url: String,
    /// User agent header value.
    user_agent: String,
}

impl RefreshEndpoint {
    /// Creates an endpoint client.
    pub fn new(
        transport: Arc<dyn Transport>,
        url: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            url: url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Creates an endpoint client from client configuration.
    pub fn from_config(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self::new(
            transport,
            config.url_for(&config.refresh_path),
            config.user_agent.clone(),
        )
    }

    /// The refresh URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Exchanges `refresh_token` for a new access token.
    ///
    /// Every failure mode (transport error, non-2xx status, `success:
    /// false`, missing or empty token) maps to `ErrorKind::RefreshFailed`.
    pub async fn exchange(&self, refresh_token: &str) -> AppResult<RefreshGrant> {
        let request = OutboundRequest {
            method: Method::Post,
            url: self.url.clone(),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), self.user_agent.clone()),
            ],
            body: Some(serde_json::json!({ "refreshToken": refresh_token })),
        };

        let response = self.transport.send(request).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::RefreshFailed,
                format!("Refresh request failed: {}", e.message),
                e,
            )
        })?;

        if !response.is_success() {
            return Err(AppError::refresh_failed(format!(
                "Refresh endpoint returned {}",
                response.status
            )));
        }

        let grant: RefreshGrant = ApiEnvelope::decode(&response.body).map_err(|e| {
            AppError::with_source(
                ErrorKind::RefreshFailed,
                "Refresh response did not contain an access token",
                e,
            )
        })?;

        if grant.access_token.is_empty() {
            return Err(AppError::refresh_failed(
                "Refresh endpoint returned an empty access token",
            ));
        }

        Ok(grant)
    }
}
