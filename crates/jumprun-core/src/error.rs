//! Errors raised by the core computations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No usable wind samples for the requested computation.
    #[error("no wind data: {0}")]
    NoWindData(&'static str),

    /// Profile samples violate the ascending, unique, finite altitude rule.
    #[error("invalid wind profile: {0}")]
    InvalidProfile(&'static str),
}
