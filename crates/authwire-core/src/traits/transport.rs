//! HTTP transport seam.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::ApiResponse;
use crate::types::request::OutboundRequest;

/// Sends fully-prepared requests.
///
/// Implementations return every HTTP status as `Ok`; only transport
/// failures (connect, timeout, body read) become `ErrorKind::Network`.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug + 'static {
    /// Send one request and collect the full response.
    async fn send(&self, request: OutboundRequest) -> AppResult<ApiResponse>;
}
