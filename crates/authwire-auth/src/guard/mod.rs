//! Navigation guard.
//!
//! [`RoutePolicy`] classifies paths; [`AuthGuard`] decides against the
//! current session snapshot. Neither touches the network.

pub mod enforcer;
pub mod policy;

pub use enforcer::{AuthGuard, GuardDecision, RedirectReason};
pub use policy::{RoutePolicy, RouteRequirement};
