//! Push error types.

use thiserror::Error;

use logix_core::CoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// A driver routine name does not split into instance tokens and a role
    /// suffix.
    #[error("driver routine '{routine}' must be named <unit>_<instance>_<suffix>")]
    DriverNaming { routine: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
