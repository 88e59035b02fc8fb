//! In-Memory Store Backend
//!
//! A fully functional store that keeps databases and collections in a
//! process-local map. Used by the `check` command and by tests, where a
//! real server would be overkill.
//!
//! # Shared State
//! All clients created by one `MemoryFactory` share a single state tree,
//! so data written through one client is visible to every other client of
//! the same factory. This mirrors how separate connections to one server
//! observe the same data.
//!
//! # Lazy Creation
//! Databases and collections come into existence on first insert, matching
//! the document-store convention. Dropping something that does not exist
//! is a successful no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::store::{ClientFactory, CollectionHandle, DatabaseHandle, Document, StoreClient};

type Collections = HashMap<String, Vec<Document>>;
type Databases = HashMap<String, Collections>;

#[derive(Debug, Default)]
struct MemoryState {
    /// target -> database -> collection -> documents
    targets: HashMap<String, Databases>,

    /// Number of clients handed out by the factory
    clients_created: usize,
}

// Poisoning is recovered; a partial extend never leaves the map
// structurally invalid.
fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Factory producing in-memory store clients
///
/// Cloning the factory shares the same state tree, so a test can hold one
/// copy for inspection while the session drives another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFactory {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFactory {
    /// Create an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of clients this factory has created so far
    #[must_use]
    pub fn clients_created(&self) -> usize {
        lock(&self.state).clients_created
    }

    /// Whether the named database holds any data under the given target
    #[must_use]
    pub fn database_exists(&self, target: &str, database: &str) -> bool {
        lock(&self.state).targets.get(target).is_some_and(|dbs| dbs.contains_key(database))
    }

    /// Whether the named collection holds any data under the given target
    #[must_use]
    pub fn collection_exists(&self, target: &str, database: &str, collection: &str) -> bool {
        lock(&self.state)
            .targets
            .get(target)
            .and_then(|dbs| dbs.get(database))
            .is_some_and(|colls| colls.contains_key(collection))
    }

    /// Snapshot of the documents currently stored in a collection
    ///
    /// Returns an empty vector when the collection does not exist.
    #[must_use]
    pub fn documents(&self, target: &str, database: &str, collection: &str) -> Vec<Document> {
        lock(&self.state)
            .targets
            .get(target)
            .and_then(|dbs| dbs.get(database))
            .and_then(|colls| colls.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Pre-populate a collection, creating the database and collection
    ///
    /// Lets tests stage pre-existing data before a provisioning pass runs.
    pub fn seed(
        &self,
        target: &str,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) {
        lock(&self.state)
            .targets
            .entry(target.to_string())
            .or_default()
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }
}

impl ClientFactory for MemoryFactory {
    type Client = MemoryClient;

    fn new_client(&self, target: &str) -> Result<MemoryClient> {
        let mut state = lock(&self.state);
        state.clients_created += 1;
        Ok(MemoryClient { target: target.to_string(), state: Arc::clone(&self.state) })
    }
}

/// Client bound to one connection target of a `MemoryFactory`
#[derive(Debug, Clone)]
pub struct MemoryClient {
    target: String,
    state: Arc<Mutex<MemoryState>>,
}

impl StoreClient for MemoryClient {
    type Database = MemoryDatabase;

    fn drop_database(&self, name: &str) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(dbs) = state.targets.get_mut(&self.target) {
            dbs.remove(name);
        }
        Ok(())
    }

    fn database(&self, name: &str) -> MemoryDatabase {
        MemoryDatabase {
            target: self.target.clone(),
            database: name.to_string(),
            state: Arc::clone(&self.state),
        }
    }
}

/// Handle to one database of an in-memory client
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    target: String,
    database: String,
    state: Arc<Mutex<MemoryState>>,
}

impl DatabaseHandle for MemoryDatabase {
    type Collection = MemoryCollection;

    fn drop_collection(&self, name: &str) -> Result<()> {
        let mut state = lock(&self.state);
        if let Some(colls) =
            state.targets.get_mut(&self.target).and_then(|dbs| dbs.get_mut(&self.database))
        {
            colls.remove(name);
        }
        Ok(())
    }

    fn collection(&self, name: &str) -> MemoryCollection {
        MemoryCollection {
            target: self.target.clone(),
            database: self.database.clone(),
            collection: name.to_string(),
            state: Arc::clone(&self.state),
        }
    }
}

/// Handle to one collection of an in-memory database
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    target: String,
    database: String,
    collection: String,
    state: Arc<Mutex<MemoryState>>,
}

impl CollectionHandle for MemoryCollection {
    fn insert_many(&self, documents: Vec<Document>) -> Result<()> {
        let mut state = lock(&self.state);
        state
            .targets
            .entry(self.target.clone())
            .or_default()
            .entry(self.database.clone())
            .or_default()
            .entry(self.collection.clone())
            .or_default()
            .extend(documents);
        Ok(())
    }
}
