//! Unified error type for the storefront.
//!
//! Every core operation returns [`Result`]. The API layer turns these into the
//! JSON response envelope; nothing below it knows about HTTP.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed input field
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of the offending field
        message: String,
    },

    /// A line item asked for fewer than one unit
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity {
        /// Product the line item refers to
        product_id: i64,
        /// Quantity that was requested
        quantity: i32,
    },

    /// A numeric argument outside its permitted range
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the accepted range
        message: String,
    },

    /// Referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record ("Product", "Order", ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Duplicate unique key (email, slug, referral code, order number)
    #[error("Conflict: {message}")]
    Conflict {
        /// Which key collided
        message: String,
    },

    /// Caller is authenticated but may not touch this record
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Reason shown to the caller
        message: String,
    },

    /// Missing, expired or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Reason shown to the caller
        message: String,
    },

    /// Operation not allowed from the record's current state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Current state and attempted action
        message: String,
    },

    /// Not enough units on hand to fill a line item
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        /// Product being ordered
        product_id: i64,
        /// Units currently in stock
        available: i32,
        /// Units requested
        requested: i32,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(DbErr),

    /// Password hashing or verification failed for a reason other than mismatch
    #[error("Password hashing error: {message}")]
    PasswordHash {
        /// Underlying hasher message
        message: String,
    },

    /// Token encoding failed
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// I/O failure (config files, socket binding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => Self::Conflict { message },
            _ => Self::Database(err),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash {
            message: err.to_string(),
        }
    }
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`] keyed by any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("Order", 42);
        assert_eq!(err.to_string(), "Order not found: 42");
    }

    #[test]
    fn test_plain_db_error_stays_database() {
        let err: Error = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, Error::Database(_)));
    }
}
