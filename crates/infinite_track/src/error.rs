//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Errors are
//! only produced while building configuration and catalogs; the running generator absorbs
//! spawn-time failures and reports them through [`crate::generator::events`] instead.
use thiserror::Error;

use crate::catalog::ObjectCategory;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid distance curve: {0}")]
    InvalidCurve(String),

    #[error("unknown {category:?} prototype #{index}")]
    UnknownPrototype {
        category: ObjectCategory,
        index: usize,
    },

    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}
