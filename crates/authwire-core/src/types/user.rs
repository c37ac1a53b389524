//! Authenticated user and role enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Roles issued by the platform.
///
/// Wire names are upper-case. The provider role was historically serialized
/// as `GIRL`, which is still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Browses listings and books services.
    Customer,
    /// Publishes listings and receives bookings.
    #[serde(alias = "GIRL")]
    Provider,
    /// Uploads media on behalf of providers.
    StaffUpload,
    /// Platform moderator.
    Admin,
}

impl UserRole {
    /// Return the role as its wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Provider => "PROVIDER",
            Self::StaffUpload => "STAFF_UPLOAD",
            Self::Admin => "ADMIN",
        }
    }

    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "PROVIDER" | "GIRL" => Ok(Self::Provider),
            "STAFF_UPLOAD" => Ok(Self::StaffUpload),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: CUSTOMER, PROVIDER, STAFF_UPLOAD, ADMIN"
            ))),
        }
    }
}

/// The user a session belongs to, as returned by login and `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Opaque user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Role used for navigation guards.
    pub role: UserRole,
    /// Public handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}
