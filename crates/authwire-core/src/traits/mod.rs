//! Core traits defined in `authwire-core` and implemented by other crates.

pub mod navigator;
pub mod token_storage;
pub mod transport;

pub use navigator::Navigator;
pub use token_storage::TokenStorage;
pub use transport::Transport;
