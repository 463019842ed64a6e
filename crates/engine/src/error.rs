//! The module contains the error the engine can throw.
//!
//! Storage failures are wrapped in [`Database`]; everything else is a domain
//! rejection carrying a human readable message. The aggregation functions
//! never return these: they recover locally (see [`crate::aggregation`]).
//!
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Kind mismatch: {0}")]
    KindMismatch(String),
    #[error("Still in use: {0}")]
    InUse(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Reports a unique index violation on write as `ExistingKey(key)`.
    ///
    /// Covers the race between a duplicate check and the insert that follows.
    pub fn on_write(err: DbErr, key: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::ExistingKey(key.into()),
            _ => Self::Database(err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::KindMismatch(a), Self::KindMismatch(b)) => a == b,
            (Self::InUse(a), Self::InUse(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
