//! The platform's response envelope.
//!
//! Endpoints answer either `{ "success": true, "data": { ... } }` or the
//! bare payload. [`ApiEnvelope`] accepts both.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Either a wrapped or a bare payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
    /// `{ success, data, message }`
    Wrapped {
        /// Whether the server reports success.
        success: bool,
        /// Payload, absent on failure.
        #[serde(default = "Option::default")]
        data: Option<T>,
        /// Server message, usually present on failure.
        #[serde(default)]
        message: Option<String>,
    },
    /// The payload itself.
    Bare(T),
}

impl<T: DeserializeOwned> ApiEnvelope<T> {
    /// Decodes a body and unwraps the payload.
    pub fn decode(body: &[u8]) -> Result<T, AppError> {
        let envelope: ApiEnvelope<T> = serde_json::from_slice(body)?;
        envelope.into_data()
    }

    /// Unwraps the payload, failing on `success: false` or missing data.
    pub fn into_data(self) -> Result<T, AppError> {
        match self {
            ApiEnvelope::Bare(data) => Ok(data),
            ApiEnvelope::Wrapped {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            ApiEnvelope::Wrapped {
                success, message, ..
            } => Err(AppError::serialization(format!(
                "Envelope without payload (success: {success}, message: {})",
                message.as_deref().unwrap_or("none")
            ))),
        }
    }
}
