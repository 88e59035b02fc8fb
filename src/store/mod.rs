//! Store Client Traits and Document Types
//!
//! This module defines the core abstractions over document-store backends.
//! Each backend (in-memory, `MongoDB`) implements the `ClientFactory` and
//! `StoreClient` trait family.
//!
//! # Connection Model
//! A `ClientFactory` turns a raw connection-target string into a live
//! `StoreClient`. The session layer caches clients per distinct target, so
//! factories must not assume they are called once per database.
//!
//! # Backend Isolation
//! Each backend implementation is completely independent. The provisioning
//! engine only ever speaks through these traits and never inspects which
//! backend it is driving.

use crate::error::Result;

// Backend implementations
pub mod memory;

#[cfg(feature = "mongodb")]
pub mod mongo;

/// A single record destined for a collection.
///
/// Records are schemaless JSON objects. Field order is preserved as read
/// from the data source (`serde_json` with the `preserve_order` feature).
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Factory for store clients, keyed by connection target
///
/// The session layer calls `new_client` at most once per distinct target
/// string per provisioning pass and reuses the returned client for every
/// database configured against that target.
pub trait ClientFactory {
    /// Client type produced by this factory
    type Client: StoreClient;

    /// Open a client against the given connection target
    ///
    /// The target string is backend-specific (a URI for `MongoDB`). It is
    /// treated as an opaque cache key by the caller and must not be
    /// normalized here.
    fn new_client(&self, target: &str) -> Result<Self::Client>;
}

/// Handle to a live store connection
///
/// Clients are cheap to clone; cloned handles share the underlying
/// connection state.
pub trait StoreClient: Clone {
    /// Database handle type for this client
    type Database: DatabaseHandle;

    /// Drop the named database, succeeding even if it does not exist
    fn drop_database(&self, name: &str) -> Result<()>;

    /// Get a handle to the named database
    ///
    /// The database is not created eagerly. Backends create it lazily on
    /// first write, so provisioning an empty database is a no-op.
    fn database(&self, name: &str) -> Self::Database;
}

/// Handle to a single database
pub trait DatabaseHandle {
    /// Collection handle type for this database
    type Collection: CollectionHandle;

    /// Drop the named collection, succeeding even if it does not exist
    fn drop_collection(&self, name: &str) -> Result<()>;

    /// Get a handle to the named collection
    fn collection(&self, name: &str) -> Self::Collection;
}

/// Handle to a single collection
pub trait CollectionHandle {
    /// Insert the given documents in order
    ///
    /// Callers skip the call entirely for an empty batch; implementations
    /// may therefore assume `documents` is non-empty.
    fn insert_many(&self, documents: Vec<Document>) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_preserves_field_order() {
        let doc: Document =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_document_round_trip() {
        let doc: Document =
            serde_json::from_str(r#"{"name": "Peter Venkman", "age": 31}"#).unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"name":"Peter Venkman","age":31}"#);
    }
}
