//! Observable session state.

pub mod state;

pub use state::{SessionSnapshot, SessionState};
