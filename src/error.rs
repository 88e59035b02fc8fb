//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout seedbed.
//! All errors are structured and map to specific error codes for JSON output.
//!
//! # Error Categories
//! - `InvalidArgument`: blank or malformed input rejected at the call site
//! - `DuplicateName`: a database or collection name reused within its scope
//! - `DataSource`: data file missing, wrong extension, or malformed JSON
//! - `StoreOperation`: drop/insert failures surfaced from the store client
//! - `Config`: settings-file load or parse failures
//!
//! Every error is raised synchronously at the point of violation and
//! propagates to the caller unhandled. Failed provisioning must fail the
//! test run loudly; nothing here is retried or downgraded to a warning.

use thiserror::Error;

/// Main error type for seedbed operations
#[derive(Error, Debug)]
pub enum SeedbedError {
    /// Blank or malformed input, rejected before any side effect
    #[error("Invalid argument `{param}`: {reason}")]
    InvalidArgument { param: String, reason: String },

    /// Database or collection name reused within its scope
    #[error("Cannot add {entity} with name `{name}` because it has already been added to this configuration")]
    DuplicateName { entity: String, name: String },

    /// Data file missing, wrong extension, or malformed JSON
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Drop or insert failure surfaced verbatim from the store client
    #[error("Store operation failed: {0}")]
    StoreOperation(String),

    /// Settings-file error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SeedbedError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::DuplicateName { .. } => "DUPLICATE_NAME",
            Self::DataSource(_) => "DATA_SOURCE",
            Self::StoreOperation(_) => "STORE_OPERATION",
            Self::Config(_) => "CONFIG",
        }
    }

    /// Get the human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create an invalid argument error naming the offending parameter
    pub fn invalid_argument(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { param: param.into(), reason: reason.into() }
    }

    /// Create a duplicate name error for a database or collection
    pub fn duplicate_name(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateName { entity: entity.into(), name: name.into() }
    }

    /// Create a data source error
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSource(message.into())
    }

    /// Create a store operation error
    pub fn store_operation(message: impl Into<String>) -> Self {
        Self::StoreOperation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for seedbed operations
pub type Result<T> = std::result::Result<T, SeedbedError>;
