//! Token storage: the in-memory store and its persistence backends.

pub mod file;
pub mod memory;
pub mod record;
pub mod store;

pub use file::FileTokenStorage;
pub use memory::MemoryTokenStorage;
pub use record::{PersistedSession, TokenLifetimes};
pub use store::TokenStore;
