//! Shared types: users, sessions, requests and responses.

pub mod envelope;
pub mod request;
pub mod session;
pub mod user;

pub use envelope::ApiEnvelope;
pub use request::{ApiResponse, Method, RequestSpec};
pub use session::{Session, TokenPair};
pub use user::{User, UserRole};
