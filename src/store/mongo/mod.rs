//! MongoDB Store Backend
//!
//! Trait implementations over the `mongodb` crate's synchronous API,
//! compiled behind the `mongodb` cargo feature. Connection targets are
//! MongoDB URIs (`mongodb://host:port`).
//!
//! Driver errors surface as `StoreOperation` with the driver's message
//! kept verbatim.

use mongodb::bson;
use mongodb::sync::{Client, Collection, Database};

use crate::error::{Result, SeedbedError};
use crate::store::{ClientFactory, CollectionHandle, DatabaseHandle, Document, StoreClient};

/// Factory opening MongoDB clients from URI connection targets
#[derive(Debug, Clone, Default)]
pub struct MongoFactory;

impl MongoFactory {
    /// Create a factory
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ClientFactory for MongoFactory {
    type Client = MongoClient;

    fn new_client(&self, target: &str) -> Result<MongoClient> {
        let client = Client::with_uri_str(target).map_err(|e| {
            SeedbedError::store_operation(format!("Failed to connect to `{target}`: {e}"))
        })?;
        Ok(MongoClient { client })
    }
}

/// Client wrapping one `mongodb::sync::Client`
///
/// The driver's client is an `Arc`-backed handle, so clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
}

impl StoreClient for MongoClient {
    type Database = MongoDatabase;

    fn drop_database(&self, name: &str) -> Result<()> {
        self.client.database(name).drop(None).map_err(|e| {
            SeedbedError::store_operation(format!("Failed to drop database `{name}`: {e}"))
        })
    }

    fn database(&self, name: &str) -> MongoDatabase {
        MongoDatabase { database: self.client.database(name) }
    }
}

/// Handle to one MongoDB database
#[derive(Clone)]
pub struct MongoDatabase {
    database: Database,
}

impl DatabaseHandle for MongoDatabase {
    type Collection = MongoCollection;

    fn drop_collection(&self, name: &str) -> Result<()> {
        self.database.collection::<bson::Document>(name).drop(None).map_err(|e| {
            SeedbedError::store_operation(format!("Failed to drop collection `{name}`: {e}"))
        })
    }

    fn collection(&self, name: &str) -> MongoCollection {
        MongoCollection { name: name.to_string(), collection: self.database.collection(name) }
    }
}

/// Handle to one MongoDB collection
#[derive(Clone)]
pub struct MongoCollection {
    name: String,
    collection: Collection<bson::Document>,
}

impl CollectionHandle for MongoCollection {
    fn insert_many(&self, documents: Vec<Document>) -> Result<()> {
        let documents = documents
            .iter()
            .map(|doc| {
                bson::to_document(doc).map_err(|e| {
                    SeedbedError::store_operation(format!(
                        "Failed to convert document for collection `{}`: {e}",
                        self.name
                    ))
                })
            })
            .collect::<Result<Vec<bson::Document>>>()?;

        self.collection.insert_many(documents, None).map_err(|e| {
            SeedbedError::store_operation(format!(
                "Failed to insert into collection `{}`: {e}",
                self.name
            ))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedConfig;
    use crate::session::SessionManager;

    const LOCAL_URI: &str = "mongodb://localhost:27017";

    #[test]
    fn test_bad_uri_is_a_store_operation_error() {
        let err = MongoFactory::new().new_client("not a uri").unwrap_err();
        assert_eq!(err.error_code(), "STORE_OPERATION");
    }

    #[test]
    #[ignore] // Requires running MongoDB instance
    fn test_provision_against_local_server() {
        use std::sync::Arc;

        use crate::provider::TypedProvider;

        #[derive(serde::Serialize)]
        struct Person {
            name: String,
        }

        let provider = Arc::new(TypedProvider::new(vec![
            Person { name: "Ray".into() },
            Person { name: "Egon".into() },
        ]));
        let config = SeedConfig::builder()
            .database("SeedbedSmokeTest")
            .unwrap()
            .connection_target(LOCAL_URI)
            .unwrap()
            .drop_first()
            .collection_records("people", true, provider)
            .unwrap()
            .build();

        let provisioned = SessionManager::new(MongoFactory::new()).provision(&config).unwrap();

        assert_eq!(provisioned.clients.len(), 1);
        assert_eq!(provisioned.summary.documents_inserted(), 2);

        // Clean up after ourselves
        provisioned.clients[LOCAL_URI].drop_database("SeedbedSmokeTest").unwrap();
    }
}
