//! Error types for the shortener
//!
//! `ServiceError` is what link operations fail with, `StoreError` is what the
//! key-value layer fails with, and `AppError` is what the command line surfaces.

use thiserror::Error;

/// Failures of the link registry and click recorder
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed URL, or a scheme other than http/https
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Shortcode must be alphanumeric and 3-20 characters long: {0}")]
    InvalidShortcode(String),

    #[error("Expiry must be between 1 and 525600 minutes")]
    InvalidExpiry,

    #[error("Shortcode already exists. Please choose a different one: {0}")]
    ShortcodeTaken(String),

    #[error("Shortcode not found: {0}")]
    NotFound(String),

    #[error("URL has expired: {0}")]
    Expired(String),

    /// The underlying store rejected the write
    #[error("Failed to save URL data: {0}")]
    StorageWriteFailed(String),
}

/// Failures of a [`KeyValueStore`](crate::database::KeyValueStore)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    /// Raised by stores that refuse writes (quota, read-only, test fakes)
    #[error("store rejected the write for key {0}")]
    Rejected(String),
}

/// Errors reported by command handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("not signed in, run `snaplink login <username> <password>` first")]
    NotSignedIn,

    #[error("invalid username or password")]
    LoginFailed,

    #[error("URL not found or expired: {0}")]
    NotFound(String),

    #[error("unknown log level: {0}")]
    UnknownLevel(String),
}
