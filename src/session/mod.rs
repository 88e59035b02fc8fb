//! Provisioning Engine
//!
//! [`SessionManager`] turns a [`SeedConfig`] into side effects against a
//! store. One `provision` call walks the configuration in declared order:
//! per database it resolves a cached client for the connection target,
//! applies the drop-first flag, then per collection drops (if flagged),
//! fetches the record set from its provider, applies matching conventions,
//! and bulk-inserts the result.
//!
//! # Client Cache
//! The cache is owned by the engine instance and keyed by the raw
//! connection-target string, so at most one client exists per distinct
//! target per provision call no matter how many databases share it. The
//! cache outlives the call: reusing one engine deliberately reuses
//! connections across provisioning cycles, while a fresh engine starts
//! with a fresh cache.
//!
//! # Ordering
//! Execution is single-threaded and sequential. Drops always run before
//! the population of the thing they drop; a drop after populate would
//! destroy the inserted data.
//!
//! # Failure Semantics
//! The configuration is validated before any side effect. Every later
//! failure (missing data file, malformed JSON, store error) aborts the
//! whole call; there is no partial-success mode and no retry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::SeedConfig;
use crate::error::Result;
use crate::store::{ClientFactory, CollectionHandle, DatabaseHandle, Document, StoreClient};

/// The provisioning engine
///
/// Owns a client factory and the connection cache. One instance must not
/// be driven from multiple threads at once; independent configurations
/// wanting concurrent provisioning use independent instances.
pub struct SessionManager<F: ClientFactory> {
    factory: F,
    clients: HashMap<String, F::Client>,
}

impl<F: ClientFactory> SessionManager<F> {
    /// Create an engine with an empty client cache
    pub fn new(factory: F) -> Self {
        Self { factory, clients: HashMap::new() }
    }

    /// Realize the configuration against the store
    ///
    /// Validates the configuration, then processes every database and
    /// collection in declared order. Returns the connection-target →
    /// client map built during the call plus a summary of what was done.
    pub fn provision(&mut self, config: &SeedConfig) -> Result<Provisioned<F::Client>> {
        config.validate()?;

        let mut used = HashMap::new();
        let mut summary = ProvisionSummary::default();

        for database in &config.databases {
            let client = match self.clients.get(&database.connection_target) {
                Some(client) => client.clone(),
                None => {
                    let client = self.factory.new_client(&database.connection_target)?;
                    self.clients.insert(database.connection_target.clone(), client.clone());
                    client
                }
            };
            used.entry(database.connection_target.clone()).or_insert_with(|| client.clone());

            let physical_database = database.physical_name();
            if database.drop_first {
                client.drop_database(&physical_database)?;
            }
            let handle = client.database(&physical_database);

            let mut collections = Vec::with_capacity(database.collections.len());
            for collection in &database.collections {
                let physical_collection =
                    collection.physical_name(database.collection_name_suffix.as_deref());
                if collection.drop_first {
                    handle.drop_collection(&physical_collection)?;
                }

                let records = collection.provider().fetch()?;
                let conventions = config.matching_conventions(collection.record_type.as_deref());
                let documents: Vec<Document> = records
                    .into_iter()
                    .map(|doc| conventions.iter().fold(doc, |doc, c| c.apply(doc)))
                    .collect();

                let documents_inserted = documents.len();
                // Empty record sets are a legal no-op
                if !documents.is_empty() {
                    handle.collection(&physical_collection).insert_many(documents)?;
                }

                collections.push(CollectionSummary {
                    name: collection.name.clone(),
                    physical_name: physical_collection,
                    dropped: collection.drop_first,
                    documents_inserted,
                });
            }

            summary.databases.push(DatabaseSummary {
                name: database.name.clone(),
                physical_name: physical_database,
                connection_target: database.connection_target.clone(),
                dropped: database.drop_first,
                collections,
            });
        }

        Ok(Provisioned { clients: used, summary })
    }
}

/// Result of one provisioning call
#[derive(Debug)]
pub struct Provisioned<C> {
    /// One client per distinct connection target touched by the call
    pub clients: HashMap<String, C>,

    /// What was dropped and inserted, in execution order
    pub summary: ProvisionSummary,
}

/// Report of everything a provisioning call did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionSummary {
    /// Databases in execution order
    pub databases: Vec<DatabaseSummary>,
}

impl ProvisionSummary {
    /// Total number of documents inserted across all collections
    #[must_use]
    pub fn documents_inserted(&self) -> usize {
        self.databases
            .iter()
            .flat_map(|db| &db.collections)
            .map(|coll| coll.documents_inserted)
            .sum()
    }
}

/// One provisioned database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSummary {
    /// Logical name from the configuration
    pub name: String,

    /// Effective physical name the store saw
    pub physical_name: String,

    /// Connection target the database was provisioned against
    pub connection_target: String,

    /// Whether the physical database was dropped first
    pub dropped: bool,

    /// Collections in execution order
    pub collections: Vec<CollectionSummary>,
}

/// One provisioned collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Logical name from the configuration
    pub name: String,

    /// Effective physical name, with any inherited suffix applied
    pub physical_name: String,

    /// Whether the physical collection was dropped first
    pub dropped: bool,

    /// Number of documents inserted (zero for an empty record set)
    pub documents_inserted: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::{Convention, DatabaseConfig, FieldCasing, TypeFilter};
    use crate::provider::TypedProvider;
    use crate::store::memory::MemoryFactory;

    fn doc(json: &str) -> Document {
        serde_json::from_str(json).unwrap()
    }

    #[derive(serde::Serialize)]
    struct Person {
        first_name: String,
    }

    #[test]
    fn test_one_client_per_distinct_target() {
        let provider: Arc<dyn crate::provider::DataProvider> =
            Arc::new(TypedProvider::new(vec![Person { first_name: "Ray".into() }]));
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://shared")
            .unwrap()
            .collection_records("people", false, Arc::clone(&provider))
            .unwrap()
            .database("Db2")
            .unwrap()
            .connection_target("memory://shared")
            .unwrap()
            .collection_records("people", false, Arc::clone(&provider))
            .unwrap()
            .database("Db3")
            .unwrap()
            .connection_target("memory://other")
            .unwrap()
            .collection_records("people", false, provider)
            .unwrap()
            .build();

        let factory = MemoryFactory::new();
        let mut session = SessionManager::new(factory.clone());
        let provisioned = session.provision(&config).unwrap();

        // Two distinct targets, so exactly two clients
        assert_eq!(factory.clients_created(), 2);
        assert_eq!(provisioned.clients.len(), 2);
        assert!(provisioned.clients.contains_key("memory://shared"));
        assert!(provisioned.clients.contains_key("memory://other"));
    }

    #[test]
    fn test_cache_persists_across_calls_on_one_engine() {
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .build();

        let factory = MemoryFactory::new();
        let mut session = SessionManager::new(factory.clone());
        session.provision(&config).unwrap();
        session.provision(&config).unwrap();
        assert_eq!(factory.clients_created(), 1);

        // A fresh engine starts with a fresh cache
        let mut fresh = SessionManager::new(factory.clone());
        fresh.provision(&config).unwrap();
        assert_eq!(factory.clients_created(), 2);
    }

    #[test]
    fn test_drop_before_populate_replaces_existing_data() {
        let factory = MemoryFactory::new();
        factory.seed("memory://a", "Db1", "people", vec![doc(r#"{"stale": true}"#)]);

        let provider = Arc::new(TypedProvider::new(vec![
            Person { first_name: "Ray".into() },
            Person { first_name: "Egon".into() },
        ]));
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .collection_records("people", true, provider)
            .unwrap()
            .build();

        SessionManager::new(factory.clone()).provision(&config).unwrap();

        let stored = factory.documents("memory://a", "Db1", "people");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["first_name"], "Ray");
        assert_eq!(stored[1]["first_name"], "Egon");
    }

    #[test]
    fn test_no_drop_preserves_existing_data() {
        let factory = MemoryFactory::new();
        factory.seed("memory://a", "Db1", "people", vec![doc(r#"{"existing": 1}"#)]);

        let provider = Arc::new(TypedProvider::new(vec![Person { first_name: "Ray".into() }]));
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .collection_records("people", false, provider)
            .unwrap()
            .build();

        SessionManager::new(factory.clone()).provision(&config).unwrap();

        let stored = factory.documents("memory://a", "Db1", "people");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["existing"], 1);
        assert_eq!(stored[1]["first_name"], "Ray");
    }

    #[test]
    fn test_database_drop_first_clears_unrelated_collections() {
        let factory = MemoryFactory::new();
        factory.seed("memory://a", "Db1", "leftovers", vec![doc(r#"{"n": 1}"#)]);

        let provider = Arc::new(TypedProvider::new(vec![Person { first_name: "Ray".into() }]));
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .drop_first()
            .collection_records("people", false, provider)
            .unwrap()
            .build();

        SessionManager::new(factory.clone()).provision(&config).unwrap();

        assert!(!factory.collection_exists("memory://a", "Db1", "leftovers"));
        assert_eq!(factory.documents("memory://a", "Db1", "people").len(), 1);
    }

    #[test]
    fn test_suffixes_shape_physical_names() {
        let factory = MemoryFactory::new();
        let provider = Arc::new(TypedProvider::new(vec![Person { first_name: "Ray".into() }]));
        let config = SeedConfig::builder()
            .database("TestDb")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .database_name_suffix("-integration")
            .unwrap()
            .collection_name_suffix("-qa")
            .unwrap()
            .collection_records("people", false, provider)
            .unwrap()
            .build();

        let provisioned = SessionManager::new(factory.clone()).provision(&config).unwrap();

        assert!(factory.collection_exists("memory://a", "TestDb-integration", "people-qa"));
        assert!(!factory.database_exists("memory://a", "TestDb"));

        let db = &provisioned.summary.databases[0];
        assert_eq!(db.physical_name, "TestDb-integration");
        assert_eq!(db.collections[0].physical_name, "people-qa");
    }

    #[test]
    fn test_empty_record_set_skips_insert() {
        let factory = MemoryFactory::new();
        let provider = Arc::new(TypedProvider::new(Vec::<Person>::new()));
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .collection_records("people", false, provider)
            .unwrap()
            .build();

        let provisioned = SessionManager::new(factory.clone()).provision(&config).unwrap();

        // No insert call means the collection was never created
        assert!(!factory.collection_exists("memory://a", "Db1", "people"));
        assert_eq!(provisioned.summary.documents_inserted(), 0);
    }

    #[test]
    fn test_conventions_apply_to_matching_typed_records() {
        let factory = MemoryFactory::new();
        let provider = Arc::new(TypedProvider::new(vec![Person { first_name: "Ray".into() }]));
        let config = SeedConfig::builder()
            .convention(
                Convention::new("camelize", FieldCasing::Camel, TypeFilter::of::<Person>())
                    .unwrap(),
            )
            .unwrap()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .collection_records("people", false, provider)
            .unwrap()
            .build();

        SessionManager::new(factory.clone()).provision(&config).unwrap();

        let stored = factory.documents("memory://a", "Db1", "people");
        assert!(stored[0].contains_key("firstName"));
        assert!(!stored[0].contains_key("first_name"));
    }

    #[test]
    fn test_validation_runs_before_any_side_effect() {
        let factory = MemoryFactory::new();
        factory.seed("memory://a", "Db1", "people", vec![doc(r#"{"n": 1}"#)]);

        // Hand-built config with duplicate database names
        let mut config = SeedConfig::new();
        let mut db = DatabaseConfig::new("Db1", "memory://a");
        db.drop_first = true;
        config.databases.push(db.clone());
        config.databases.push(db);

        let err = SessionManager::new(factory.clone()).provision(&config).unwrap_err();

        assert_eq!(err.error_code(), "DUPLICATE_NAME");
        // Nothing was dropped and no client was created
        assert_eq!(factory.clients_created(), 0);
        assert_eq!(factory.documents("memory://a", "Db1", "people").len(), 1);
    }

    #[test]
    fn test_missing_data_file_aborts_the_call() {
        let factory = MemoryFactory::new();
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .collection("people", false, "/nonexistent/people.json")
            .unwrap()
            .build();

        let err = SessionManager::new(factory).provision(&config).unwrap_err();
        assert_eq!(err.error_code(), "DATA_SOURCE");
    }

    #[test]
    fn test_provisioned_result_is_debug_formattable() {
        // unwrap_err()/unwrap() in callers need the Ok type to be Debug
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .build();

        let provisioned = SessionManager::new(MemoryFactory::new()).provision(&config).unwrap();

        let rendered = format!("{provisioned:?}");
        assert!(rendered.contains("Provisioned"));
        assert!(rendered.contains("Db1"));
    }

    #[test]
    fn test_summary_reports_execution_order_and_counts() {
        let factory = MemoryFactory::new();
        let provider = Arc::new(TypedProvider::new(vec![
            Person { first_name: "Ray".into() },
            Person { first_name: "Egon".into() },
        ]));
        let config = SeedConfig::builder()
            .database("Db1")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .drop_first()
            .collection_records("people", true, provider)
            .unwrap()
            .database("Db2")
            .unwrap()
            .connection_target("memory://a")
            .unwrap()
            .build();

        let provisioned = SessionManager::new(factory).provision(&config).unwrap();
        let summary = &provisioned.summary;

        assert_eq!(summary.databases.len(), 2);
        assert_eq!(summary.databases[0].name, "Db1");
        assert!(summary.databases[0].dropped);
        assert_eq!(summary.databases[0].collections[0].documents_inserted, 2);
        assert!(summary.databases[0].collections[0].dropped);
        assert_eq!(summary.databases[1].name, "Db2");
        assert!(summary.databases[1].collections.is_empty());
        assert_eq!(summary.documents_inserted(), 2);
    }
}
