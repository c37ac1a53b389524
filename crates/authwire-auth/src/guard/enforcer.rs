//! Guard decisions against the current session snapshot.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use authwire_core::config::GuardConfig;
use authwire_core::types::UserRole;

use super::policy::{RoutePolicy, RouteRequirement};
use crate::session::SessionState;

/// Why navigation was redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// No session.
    Unauthenticated,
    /// The session's role is not admitted.
    Forbidden,
    /// The path moved permanently.
    Moved,
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectReason::Unauthenticated => write!(f, "unauthenticated"),
            RedirectReason::Forbidden => write!(f, "forbidden"),
            RedirectReason::Moved => write!(f, "moved"),
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Navigation may proceed.
    Admit,
    /// Navigation must go elsewhere.
    Redirect {
        /// Destination route.
        to: String,
        /// Why.
        reason: RedirectReason,
    },
}

impl GuardDecision {
    /// Whether navigation may proceed.
    pub fn is_admitted(&self) -> bool {
        matches!(self, GuardDecision::Admit)
    }
}

/// Role-aware navigation guard.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    state: Arc<SessionState>,
    policy: RoutePolicy,
    login_route: String,
}

impl AuthGuard {
    /// Creates a guard reading `state`.
    pub fn new(state: Arc<SessionState>, config: &GuardConfig) -> Self {
        Self {
            state,
            policy: RoutePolicy::from_config(config),
            login_route: config.login_route.clone(),
        }
    }

    /// The route policy.
    pub fn policy(&self) -> &RoutePolicy {
        &self.policy
    }

    /// Checks navigation to `target` against an explicit role set.
    ///
    /// Unauthenticated sessions go to the login route. A non-empty
    /// `allowed_roles` that does not contain the user's role also redirects
    /// there; a session whose user is not loaded yet has no role and is
    /// redirected the same way.
    pub fn check(&self, target: &str, allowed_roles: &[UserRole]) -> GuardDecision {
        let snapshot = self.state.snapshot();

        let decision = if !snapshot.authenticated {
            self.redirect(RedirectReason::Unauthenticated)
        } else if !allowed_roles.is_empty()
            && !snapshot.role().is_some_and(|r| allowed_roles.contains(&r))
        {
            self.redirect(RedirectReason::Forbidden)
        } else {
            GuardDecision::Admit
        };

        debug!(path = target, decision = ?decision, "Guard check");
        decision
    }

    /// Checks navigation to `target` using the route policy.
    pub fn admit(&self, target: &str) -> GuardDecision {
        if let Some(to) = self.policy.canonical(target) {
            return GuardDecision::Redirect {
                to,
                reason: RedirectReason::Moved,
            };
        }

        match self.policy.requirement(target) {
            RouteRequirement::Public => GuardDecision::Admit,
            RouteRequirement::Authenticated(roles) => self.check(target, &roles),
        }
    }

    fn redirect(&self, reason: RedirectReason) -> GuardDecision {
        GuardDecision::Redirect {
            to: self.login_route.clone(),
            reason,
        }
    }
}
