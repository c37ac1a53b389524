//! # authwire-http
//!
//! The authenticated HTTP client and the session manager that owns it.
//!
//! ## Modules
//!
//! - `transport`: `reqwest`-backed [`Transport`](authwire_core::traits::Transport)
//! - `client`: Bearer attachment and transparent refresh on 401
//! - `manager`: Login, logout, restore, and wiring of the whole session stack
//! - `navigator`: Default navigator that logs redirects

pub mod client;
pub mod manager;
pub mod navigator;
pub mod transport;

pub use client::HttpClient;
pub use manager::SessionManager;
pub use navigator::LogNavigator;
pub use transport::ReqwestTransport;
