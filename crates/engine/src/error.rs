//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when caller arguments are malformed, before any
//!   gateway call is made.
//! - [`Computation`] thrown when a single price computation cannot proceed.
//! - [`KeyNotFound`] thrown when an item is not found.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`Computation`]: EngineError::Computation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    Validation(String),
    #[error("Computation failed: {0}")]
    Computation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Computation(a), Self::Computation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
