//! Errors raised while reading, decoding or writing L5X documents.

use std::io;

use thiserror::Error;

use logix_core::CoreError;

#[derive(Debug, Error)]
pub enum L5xError {
    /// The document is not well-formed markup.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A structurally required element is absent.
    #[error("missing element <{element}>")]
    MissingElement { element: String },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid export profile: {0}")]
    Profile(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, L5xError>;
