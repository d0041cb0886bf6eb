//! Errors raised by store transitions.

use thiserror::Error;

/// A transition was rejected. The table is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Scope or name contains characters outside the allowed set.
    #[error("scope or name has bad characters: scope '{scope}', name '{name}'")]
    Validation { scope: String, name: String },

    /// No variable with this id.
    #[error("no variable with id '{0}'")]
    NotFound(String),

    /// The operation is not allowed on this variable.
    #[error("cannot update derived variable '{0}'")]
    InvalidOperation(String),
}

/// Convenience alias used by the reducer and store.
pub type StoreResult<T> = Result<T, StoreError>;
