//! 仓储层 (data access)
//!
//! Free async functions over the SQLite pool, one module per aggregate.
//! All writes stamp `updated_at`; state transitions use conditional
//! `UPDATE ... WHERE status = ?` guards so concurrent requests serialize
//! on the row instead of racing in application code.

// Accounts
pub mod users;

// Catalog
pub mod categories;
pub mod products;

// Floor
pub mod orders;
pub mod tables;

// Money
pub mod cash_registers;

// Back office
pub mod alerts;
pub mod backups;
pub mod customers;
pub mod reports;
pub mod waste_logs;

use thiserror::Error;

/// Error type shared by every repository module
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity exists but its current status forbids the operation
    #[error("Invalid state: {0}")]
    State(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

/// Shorthand for repository return values
pub type RepoResult<T> = Result<T, RepoError>;
