//! Seedbed - Declarative Test-Fixture Provisioning
//!
//! Seedbed puts one or more document databases into a known, reproducible
//! state before a test suite runs: describe the databases, collections,
//! and data declaratively, and the provisioning engine realizes that
//! description against the target store.
//!
//! # Core Pieces
//! - A configuration model describing the desired state
//! - A typestate fluent builder that makes invalid construction orders
//!   compile errors
//! - A provisioning engine that caches one client per connection target,
//!   applies drop-first semantics in a deterministic order, and bulk-loads
//!   each collection from its data source
//! - Two data providers: JSON-array files and caller-supplied typed records
//!
//! # Module Organization
//! - [`error`] - Error types and stable error codes
//! - [`config`] - Configuration model, conventions, settings-file loader
//! - [`builder`] - Typestate fluent builder over the model
//! - [`provider`] - Data provider trait and shipped implementations
//! - [`store`] - Store client traits plus in-memory and MongoDB backends
//! - [`session`] - The provisioning engine
//! - [`output`] - JSON output envelopes for the CLI
//!
//! # Example
//! ```
//! use seedbed::{MemoryFactory, SeedConfig, SessionManager, TypedProvider};
//! use std::sync::Arc;
//!
//! #[derive(serde::Serialize)]
//! struct Person { name: String }
//!
//! let provider = Arc::new(TypedProvider::new(vec![
//!     Person { name: "Ray".into() },
//! ]));
//! let config = SeedConfig::builder()
//!     .database("TestDb1")?
//!     .connection_target("memory://local")?
//!     .drop_first()
//!     .collection_records("people", true, provider)?
//!     .build();
//!
//! let factory = MemoryFactory::new();
//! let provisioned = SessionManager::new(factory.clone()).provision(&config)?;
//!
//! assert_eq!(provisioned.summary.documents_inserted(), 1);
//! assert_eq!(factory.documents("memory://local", "TestDb1", "people").len(), 1);
//! # Ok::<(), seedbed::SeedbedError>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod output;
pub mod provider;
pub mod session;
pub mod store;

// Re-export commonly used types for convenience
pub use builder::{CollectionsBuilder, ConfigBuilder, DatabaseBuilder, DatabaseOptions};
pub use config::{
    CollectionConfig, Convention, DataSource, DatabaseConfig, FieldCasing, SeedConfig, TypeFilter,
};
pub use error::{Result, SeedbedError};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use provider::{DataProvider, JsonFileProvider, TypedProvider};
pub use session::{
    CollectionSummary, DatabaseSummary, Provisioned, ProvisionSummary, SessionManager,
};
pub use store::memory::MemoryFactory;
pub use store::{ClientFactory, CollectionHandle, DatabaseHandle, Document, StoreClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_exports() {
        // Verify that key types are accessible through the crate root
        let _config = SeedConfig::new();
        let _builder = SeedConfig::builder();
        let _factory = MemoryFactory::new();
        let _err = SeedbedError::invalid_argument("name", "blank");
    }
}
