//! JSON Output Envelope Types
//!
//! This module defines the structured JSON output format for the seedbed
//! CLI. Every invocation prints exactly one envelope to stdout.
//!
//! # Output Contract
//! - Success: `{"ok": true, "command": "...", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "command": "...", "error": {"code": "...", "message": "..."}}`
//!
//! Output is stable and suitable for programmatic parsing; the library
//! layer never prints.

use serde::{Deserialize, Serialize};

use crate::error::SeedbedError;

/// Success envelope for operation results
///
/// Generic over the data type to support different operation return values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Command that was executed (check, run, init)
    pub command: String,

    /// Operation-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    /// Create a new success envelope
    pub fn new(command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self { ok: true, command: command.into(), data, meta }
    }
}

/// Error envelope for operation failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Command that was attempted (check, run, init)
    pub command: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    /// Create a new error envelope
    pub fn new(command: impl Into<String>, error: ErrorInfo) -> Self {
        Self { ok: false, command: command.into(), error }
    }

    /// Create an error envelope from a `SeedbedError`
    pub fn from_error(command: impl Into<String>, err: &SeedbedError) -> Self {
        Self::new(command, ErrorInfo { code: err.error_code().to_string(), message: err.message() })
    }
}

/// Error information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "DATA_SOURCE", "DUPLICATE_NAME")
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error info
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,

    /// Total documents inserted (None for commands that insert nothing)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_inserted: Option<usize>,
}

impl Metadata {
    /// Create new metadata with just execution time
    #[must_use]
    pub fn new(execution_ms: u64) -> Self {
        Self { execution_ms, documents_inserted: None }
    }

    /// Create new metadata with execution time and insert count
    #[must_use]
    pub fn with_documents(execution_ms: u64, documents_inserted: usize) -> Self {
        Self { execution_ms, documents_inserted: Some(documents_inserted) }
    }
}
