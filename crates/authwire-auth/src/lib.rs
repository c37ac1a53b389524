//! # authwire-auth
//!
//! Session credentials and their lifecycle for the authenticated client.
//!
//! ## Modules
//!
//! - `token`: Token store with atomic swaps and pluggable persistence
//! - `session`: Observable session state derived from the token store
//! - `refresh`: Single-flight refresh state machine and pending request queue
//! - `guard`: Role-aware navigation guard and route policy

pub mod guard;
pub mod refresh;
pub mod session;
pub mod token;

pub use guard::{AuthGuard, GuardDecision, RedirectReason, RoutePolicy};
pub use refresh::{RefreshCoordinator, RefreshEndpoint, RefreshState, Replay};
pub use session::{SessionSnapshot, SessionState};
pub use token::{FileTokenStorage, MemoryTokenStorage, TokenLifetimes, TokenStore};
