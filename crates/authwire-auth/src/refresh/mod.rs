//! Single-flight token refresh.
//!
//! The coordinator owns the [`RefreshState`] machine and the
//! [`PendingQueue`] of requests waiting on it; the endpoint module speaks
//! the refresh protocol.

pub mod coordinator;
pub mod endpoint;
pub mod queue;
pub mod state;

pub use coordinator::{CoordinatorStats, RefreshCoordinator};
pub use endpoint::{RefreshEndpoint, RefreshGrant};
pub use queue::{PendingQueue, PendingRequest, Replay};
pub use state::RefreshState;
