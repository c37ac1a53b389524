//! Path classification.

use serde::Serialize;

use authwire_core::config::{GuardConfig, ProtectedRoute};
use authwire_core::types::UserRole;

/// What a path requires from the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "access", content = "roles", rename_all = "snake_case")]
pub enum RouteRequirement {
    /// Anyone may navigate here.
    Public,
    /// A session is required; a non-empty list restricts the roles.
    Authenticated(Vec<UserRole>),
}

/// Maps paths to [`RouteRequirement`]s.
///
/// Prefixes match on segment boundaries: `/girl` covers `/girl` and
/// `/girl/profile` but not `/girls`. Paths matching nothing public or
/// protected require any authenticated session.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    public_routes: Vec<String>,
    public_prefixes: Vec<String>,
    protected: Vec<ProtectedRoute>,
}

impl RoutePolicy {
    /// Builds the policy from guard configuration.
    pub fn from_config(config: &GuardConfig) -> Self {
        Self {
            public_routes: config.public_routes.clone(),
            public_prefixes: config.public_prefixes.clone(),
            protected: config.protected.clone(),
        }
    }

    /// Classifies `target`. Query string and fragment are ignored.
    pub fn requirement(&self, target: &str) -> RouteRequirement {
        let path = normalize(target);

        if self.public_routes.iter().any(|r| r == path)
            || self.public_prefixes.iter().any(|p| under_prefix(path, p))
        {
            return RouteRequirement::Public;
        }

        self.protected
            .iter()
            .find(|route| under_prefix(path, &route.prefix))
            .map(|route| RouteRequirement::Authenticated(route.roles.clone()))
            .unwrap_or(RouteRequirement::Authenticated(Vec::new()))
    }

    /// The canonical location for a legacy URL, if `target` is one.
    ///
    /// `/girls/{id}/{slug}` moved to `/girls/{slug}`.
    pub fn canonical(&self, target: &str) -> Option<String> {
        let path = normalize(target);
        let rest = path.strip_prefix("/girls/")?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let mut segments = rest.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(id), Some(slug), None) if !id.is_empty() && !slug.is_empty() => {
                Some(format!("/girls/{slug}"))
            }
            _ => None,
        }
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default())
    }
}

/// Strips query and fragment.
fn normalize(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    &target[..end]
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}
