//! Core error types.

use thiserror::Error;

/// Errors raised by the entity graph, the value codec and the dependency closure.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A name failed validation. The previous name is left unchanged.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// An object that structurally requires a data type declares none.
    #[error("{kind} '{name}' has no data type")]
    MissingDataType { kind: &'static str, name: String },

    /// A data type contains itself, directly or through its members.
    #[error("data type '{name}' is defined recursively")]
    RecursiveDataType { name: String },

    /// A value tree does not fit one of the supported node shapes.
    #[error("invalid value shape for '{name}': {detail}")]
    InvalidValueShape { name: String, detail: String },

    /// A named object does not exist in the collection it was looked up in.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },
}

/// Convenience alias for core results.
pub type Result<T> = std::result::Result<T, CoreError>;
