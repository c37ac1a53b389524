//! Convenience result type alias for authwire.

use crate::error::AppError;

/// A specialized `Result` type for authwire operations.
///
/// Every crate in the workspace returns `AppResult<T>` so errors flow
/// through `?` without per-crate conversions.
pub type AppResult<T> = Result<T, AppError>;
