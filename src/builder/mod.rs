//! Typestate Configuration Builder
//!
//! A staged fluent builder over [`SeedConfig`]. Each stage is a distinct
//! type consuming `self`, so an illegal call order is a compile error
//! rather than a runtime check:
//!
//! ```text
//! ConfigBuilder --database--> DatabaseBuilder --connection_target-->
//! DatabaseOptions --collection--> CollectionsBuilder --database--> ...
//! ```
//!
//! `build()` exists from the moment the current database has a connection
//! target, and never fails: every invariant is enforced at the call that
//! would violate it, so the finished configuration is consistent by
//! construction.
//!
//! # Example
//! ```
//! use seedbed::SeedConfig;
//!
//! let config = SeedConfig::builder()
//!     .database("TestDb1")?
//!     .connection_target("mongodb://localhost:27017")?
//!     .drop_first()
//!     .collection("people", true, "data/people.json")?
//!     .collection("places", false, "data/places.json")?
//!     .build();
//!
//! assert_eq!(config.databases.len(), 1);
//! # Ok::<(), seedbed::SeedbedError>(())
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{
    CollectionConfig, Convention, DatabaseConfig, SeedConfig,
};
use crate::error::{Result, SeedbedError};
use crate::provider::DataProvider;

impl SeedConfig {
    /// Start building a configuration through the staged fluent API
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder { config: Self::new() }
    }
}

/// Initial stage: conventions may be registered, then the first database
/// opens the configuration proper
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: SeedConfig,
}

impl ConfigBuilder {
    /// Register a naming convention
    ///
    /// Conventions are only registrable before the first database, and
    /// their names must be unique.
    pub fn convention(mut self, convention: Convention) -> Result<Self> {
        if self.config.conventions.iter().any(|c| c.name() == convention.name()) {
            return Err(SeedbedError::duplicate_name("convention", convention.name()));
        }
        self.config.conventions.push(convention);
        Ok(self)
    }

    /// Open the first database entry
    pub fn database(self, name: impl Into<String>) -> Result<DatabaseBuilder> {
        let name = checked_database_name(name.into(), &self.config)?;
        Ok(DatabaseBuilder { config: self.config, name })
    }
}

/// A database has been named but has no connection target yet
///
/// The only way forward is [`DatabaseBuilder::connection_target`]; calling
/// it consumes this stage, so it cannot run twice for the same database.
#[derive(Debug)]
pub struct DatabaseBuilder {
    config: SeedConfig,
    name: String,
}

impl DatabaseBuilder {
    /// Set the connection target for the current database
    pub fn connection_target(self, target: impl Into<String>) -> Result<DatabaseOptions> {
        let target = target.into();
        if target.trim().is_empty() {
            return Err(SeedbedError::invalid_argument(
                "connection_target",
                "must not be blank",
            ));
        }
        Ok(DatabaseOptions {
            config: self.config,
            database: DatabaseConfig::new(self.name, target),
        })
    }
}

/// The current database is connectable and its options are configurable
///
/// Every option setter returns the same stage, so options are fluent,
/// repeatable, and last-write-wins. Adding the first collection moves to
/// [`CollectionsBuilder`]; `build()` and `database()` are already reachable
/// here, so a database without collections is legal (it provisions as name
/// resolution plus an optional drop).
#[derive(Debug)]
pub struct DatabaseOptions {
    config: SeedConfig,
    database: DatabaseConfig,
}

impl DatabaseOptions {
    /// Append this suffix to the logical name to form the physical
    /// database name
    pub fn database_name_suffix(mut self, suffix: impl Into<String>) -> Result<Self> {
        self.database.database_name_suffix = Some(checked_suffix("database_name_suffix", suffix)?);
        Ok(self)
    }

    /// Append this suffix to every child collection's logical name
    pub fn collection_name_suffix(mut self, suffix: impl Into<String>) -> Result<Self> {
        self.database.collection_name_suffix =
            Some(checked_suffix("collection_name_suffix", suffix)?);
        Ok(self)
    }

    /// Drop the physical database before any collection work
    #[must_use]
    pub fn drop_first(mut self) -> Self {
        self.database.drop_first = true;
        self
    }

    /// Add a collection fed by a JSON data file
    pub fn collection(
        self,
        name: impl Into<String>,
        drop_first: bool,
        data_file: impl Into<PathBuf>,
    ) -> Result<CollectionsBuilder> {
        CollectionsBuilder { config: self.config, database: self.database }
            .collection(name, drop_first, data_file)
    }

    /// Add a collection fed by a data provider
    pub fn collection_records(
        self,
        name: impl Into<String>,
        drop_first: bool,
        provider: Arc<dyn DataProvider>,
    ) -> Result<CollectionsBuilder> {
        CollectionsBuilder { config: self.config, database: self.database }
            .collection_records(name, drop_first, provider)
    }

    /// Commit the current database and open the next one
    ///
    /// The committed database has no collections; it provisions as name
    /// resolution plus an optional drop.
    pub fn database(mut self, name: impl Into<String>) -> Result<DatabaseBuilder> {
        self.config.databases.push(self.database);
        let name = checked_database_name(name.into(), &self.config)?;
        Ok(DatabaseBuilder { config: self.config, name })
    }

    /// Finish, committing the current database
    #[must_use]
    pub fn build(mut self) -> SeedConfig {
        self.config.databases.push(self.database);
        self.config
    }
}

/// The current database has at least one collection
///
/// More collections can be added, a new database can be opened, or the
/// configuration can be finished.
#[derive(Debug)]
pub struct CollectionsBuilder {
    config: SeedConfig,
    database: DatabaseConfig,
}

impl CollectionsBuilder {
    /// Add a collection fed by a JSON data file
    pub fn collection(
        mut self,
        name: impl Into<String>,
        drop_first: bool,
        data_file: impl Into<PathBuf>,
    ) -> Result<Self> {
        let name = self.checked_collection_name(name.into())?;
        let data_file = data_file.into();
        if data_file.as_os_str().is_empty() {
            return Err(SeedbedError::invalid_argument("data_file", "must not be blank"));
        }
        self.database.collections.push(CollectionConfig::from_data_file(
            name, data_file, drop_first,
        ));
        Ok(self)
    }

    /// Add a collection fed by a data provider
    pub fn collection_records(
        mut self,
        name: impl Into<String>,
        drop_first: bool,
        provider: Arc<dyn DataProvider>,
    ) -> Result<Self> {
        let name = self.checked_collection_name(name.into())?;
        self.database.collections.push(CollectionConfig::from_provider(
            name, provider, drop_first,
        ));
        Ok(self)
    }

    /// Commit the current database and open the next one
    pub fn database(mut self, name: impl Into<String>) -> Result<DatabaseBuilder> {
        self.config.databases.push(self.database);
        let name = checked_database_name(name.into(), &self.config)?;
        Ok(DatabaseBuilder { config: self.config, name })
    }

    /// Finish, committing the current database
    #[must_use]
    pub fn build(mut self) -> SeedConfig {
        self.config.databases.push(self.database);
        self.config
    }

    fn checked_collection_name(&self, name: String) -> Result<String> {
        if name.trim().is_empty() {
            return Err(SeedbedError::invalid_argument(
                "name",
                "collection name must not be blank",
            ));
        }
        if self.database.collections.iter().any(|c| c.name == name) {
            return Err(SeedbedError::duplicate_name("collection", name));
        }
        Ok(name)
    }
}

fn checked_database_name(name: String, config: &SeedConfig) -> Result<String> {
    if name.trim().is_empty() {
        return Err(SeedbedError::invalid_argument("name", "database name must not be blank"));
    }
    if config.databases.iter().any(|db| db.name == name) {
        return Err(SeedbedError::duplicate_name("database", name));
    }
    Ok(name)
}

fn checked_suffix(param: &str, suffix: impl Into<String>) -> Result<String> {
    let suffix = suffix.into();
    if suffix.trim().is_empty() {
        return Err(SeedbedError::invalid_argument(param, "must not be blank"));
    }
    Ok(suffix)
}
