//! Session lifecycle events.
//!
//! Published by the session state on a broadcast channel so that
//! observers (UI shells, audit logging) can react without polling.

pub mod session;

pub use session::{SessionEvent, TeardownReason};
