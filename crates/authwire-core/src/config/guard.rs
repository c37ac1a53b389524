//! Route guard configuration.

use serde::{Deserialize, Serialize};

use crate::types::UserRole;

/// A path prefix restricted to a set of roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedRoute {
    /// Path prefix, matched on segment boundaries.
    pub prefix: String,
    /// Roles admitted under the prefix. Empty means any authenticated user.
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

/// Navigation guard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Where unauthenticated or unauthorized navigation is sent.
    #[serde(default = "default_login_route")]
    pub login_route: String,
    /// Paths that never require a session (exact match).
    #[serde(default = "default_public_routes")]
    pub public_routes: Vec<String>,
    /// Path prefixes that never require a session.
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,
    /// Role-gated prefixes, checked in order.
    #[serde(default = "default_protected")]
    pub protected: Vec<ProtectedRoute>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_route: default_login_route(),
            public_routes: default_public_routes(),
            public_prefixes: default_public_prefixes(),
            protected: default_protected(),
        }
    }
}

fn default_login_route() -> String {
    "/auth/login".to_string()
}

fn default_public_routes() -> Vec<String> {
    ["/", "/auth/login", "/auth/register"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_public_prefixes() -> Vec<String> {
    ["/girls", "/posts", "/search", "/gai-goi"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_protected() -> Vec<ProtectedRoute> {
    vec![
        ProtectedRoute {
            prefix: "/admin".to_string(),
            roles: vec![UserRole::Admin],
        },
        ProtectedRoute {
            prefix: "/girl".to_string(),
            roles: vec![UserRole::Provider],
        },
        ProtectedRoute {
            prefix: "/client".to_string(),
            roles: vec![UserRole::Customer, UserRole::StaffUpload, UserRole::Provider],
        },
    ]
}
