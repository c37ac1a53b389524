//! # authwire-core
//!
//! Core crate for authwire. Contains the session and request types,
//! configuration schemas, the seams implemented by other crates
//! (token persistence, transport, navigation), session events,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other authwire crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
