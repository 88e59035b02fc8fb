//! Configuration Model
//!
//! This module holds the declarative description of the desired store
//! state: which databases exist, which collections they contain, where
//! each collection's data comes from, and which naming conventions apply
//! when records become documents.
//!
//! # Construction Paths
//! A `SeedConfig` can be produced three ways:
//! 1. The typestate builder (`SeedConfig::builder()`), which enforces the
//!    construction order statically.
//! 2. A JSON settings file via [`SeedConfig::from_file`].
//! 3. By hand, filling the public fields directly.
//!
//! Hand-built and deserialized configurations are re-checked by
//! [`SeedConfig::validate`] before the provisioning engine touches the
//! store.
//!
//! # Settings File Format
//! A JSON object with a `databases` array:
//! ```json
//! {
//!   "databases": [{
//!     "databaseName": "TestDb1",
//!     "connectionString": "mongodb://localhost:27017",
//!     "databaseNameSuffix": "",
//!     "collectionNameSuffix": "",
//!     "dropFirst": true,
//!     "collections": [{
//!       "collectionName": "people",
//!       "dataFileLocation": "data/people.json",
//!       "dropFirst": true
//!     }]
//!   }]
//! }
//! ```
//! PascalCase keys (`DatabaseName`, ...) are accepted as aliases. Conventions
//! are code-only and never appear in settings files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeedbedError};
use crate::provider::{DataProvider, JsonFileProvider};

/// Root configuration: every database to provision plus the conventions
/// applied when translating typed records into documents
#[derive(Debug, Clone, Default)]
pub struct SeedConfig {
    /// Databases in provisioning order, names unique
    pub databases: Vec<DatabaseConfig>,

    /// Naming conventions in declaration order
    pub conventions: Vec<Convention>,
}

impl SeedConfig {
    /// Create an empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON settings file
    ///
    /// The path must point to an existing `.json` file matching the format
    /// documented at module level. Blank suffix strings are normalized to
    /// `None`, and the loaded configuration is validated before it is
    /// returned.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display();

        if path.as_os_str().is_empty() {
            return Err(SeedbedError::config("Settings file path must not be blank"));
        }
        if !path.is_file() {
            return Err(SeedbedError::config(format!(
                "Error validating file `{display}`: file does not exist"
            )));
        }
        let extension = path.extension().and_then(std::ffi::OsStr::to_str);
        if extension != Some("json") {
            return Err(SeedbedError::config(format!(
                "Invalid file type for `{display}`: settings file must be a .json file"
            )));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            SeedbedError::config(format!("Could not read settings file `{display}`: {e}"))
        })?;

        let file: ConfigFile = serde_json::from_str(&contents).map_err(|e| {
            SeedbedError::config(format!("Invalid settings file `{display}`: {e}"))
        })?;

        let config = Self::from(file);
        config.validate()?;
        Ok(config)
    }

    /// Write this configuration as a JSON settings file
    ///
    /// Only file-backed collections can be persisted. A collection backed
    /// by an in-code data provider has no file representation and makes
    /// this call fail. Conventions are code-only and are not written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let display = path.display();

        let file = ConfigFile::try_from(self)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    SeedbedError::config(format!(
                        "Could not create settings directory for `{display}`: {e}"
                    ))
                })?;
            }
        }

        let contents = serde_json::to_string_pretty(&file).map_err(|e| {
            SeedbedError::config(format!("Could not serialize settings: {e}"))
        })?;

        fs::write(path, contents).map_err(|e| {
            SeedbedError::config(format!("Could not write settings file `{display}`: {e}"))
        })
    }

    /// Check the model invariants
    ///
    /// Names must be non-blank, database names unique across the
    /// configuration, collection names unique within their database, and
    /// every database needs a connection target. The builder upholds all
    /// of this during construction; this re-check covers hand-built and
    /// deserialized configurations.
    pub fn validate(&self) -> Result<()> {
        let mut database_names = HashSet::new();
        for database in &self.databases {
            if database.name.trim().is_empty() {
                return Err(SeedbedError::invalid_argument(
                    "name",
                    "database name must not be blank",
                ));
            }
            if database.connection_target.trim().is_empty() {
                return Err(SeedbedError::invalid_argument(
                    "connection_target",
                    format!("must not be blank for database `{}`", database.name),
                ));
            }
            if !database_names.insert(database.name.as_str()) {
                return Err(SeedbedError::duplicate_name("database", &database.name));
            }

            let mut collection_names = HashSet::new();
            for collection in &database.collections {
                if collection.name.trim().is_empty() {
                    return Err(SeedbedError::invalid_argument(
                        "name",
                        format!(
                            "collection name must not be blank in database `{}`",
                            database.name
                        ),
                    ));
                }
                if !collection_names.insert(collection.name.as_str()) {
                    return Err(SeedbedError::duplicate_name("collection", &collection.name));
                }
            }
        }
        Ok(())
    }

    /// Conventions whose filter matches the given record type, in
    /// declaration order
    pub fn matching_conventions(&self, record_type: Option<&str>) -> Vec<&Convention> {
        self.conventions.iter().filter(|c| c.applies_to(record_type)).collect()
    }
}

/// One logical database to provision
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Logical name, unique within the configuration
    pub name: String,

    /// Opaque connection target; multiple databases may share one
    pub connection_target: String,

    /// Appended to the logical name to form the physical database name
    pub database_name_suffix: Option<String>,

    /// Appended to every child collection's logical name
    pub collection_name_suffix: Option<String>,

    /// Drop the physical database before any collection work
    pub drop_first: bool,

    /// Collections in provisioning order, names unique within the database
    pub collections: Vec<CollectionConfig>,
}

impl DatabaseConfig {
    /// Create a database entry with no suffixes, no drop, no collections
    pub fn new(name: impl Into<String>, connection_target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connection_target: connection_target.into(),
            database_name_suffix: None,
            collection_name_suffix: None,
            drop_first: false,
            collections: Vec::new(),
        }
    }

    /// Effective physical database name
    ///
    /// The suffix is appended only when it is non-blank; a missing or
    /// whitespace-only suffix leaves the logical name untouched.
    #[must_use]
    pub fn physical_name(&self) -> String {
        apply_suffix(&self.name, self.database_name_suffix.as_deref())
    }
}

/// One collection inside a database entry
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Logical name, unique within its database
    pub name: String,

    /// Drop the physical collection before inserting data
    pub drop_first: bool,

    /// Where this collection's records come from
    pub source: DataSource,

    /// Declared record type for convention matching
    ///
    /// Populated from the provider when the collection is built through
    /// the builder; `None` for file-backed sources.
    pub record_type: Option<String>,
}

impl CollectionConfig {
    /// Create a collection entry fed by a JSON data file
    pub fn from_data_file(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        drop_first: bool,
    ) -> Self {
        Self {
            name: name.into(),
            drop_first,
            source: DataSource::File(path.into()),
            record_type: None,
        }
    }

    /// Create a collection entry fed by a data provider
    ///
    /// The declared record type is taken from the provider.
    pub fn from_provider(
        name: impl Into<String>,
        provider: Arc<dyn DataProvider>,
        drop_first: bool,
    ) -> Self {
        let record_type = provider.record_type().map(String::from);
        Self { name: name.into(), drop_first, source: DataSource::Provider(provider), record_type }
    }

    /// Effective physical collection name given the parent database's
    /// collection-name suffix
    #[must_use]
    pub fn physical_name(&self, inherited_suffix: Option<&str>) -> String {
        apply_suffix(&self.name, inherited_suffix)
    }

    /// Resolve the data provider for this collection
    ///
    /// File sources get a fresh [`JsonFileProvider`]; provider sources hand
    /// back the configured instance.
    #[must_use]
    pub fn provider(&self) -> Arc<dyn DataProvider> {
        match &self.source {
            DataSource::File(path) => Arc::new(JsonFileProvider::new(path.clone())),
            DataSource::Provider(provider) => Arc::clone(provider),
        }
    }
}

/// Exactly one source of records per collection
///
/// The mutual exclusion between "file path" and "provider instance" is
/// structural rather than a runtime check.
#[derive(Clone)]
pub enum DataSource {
    /// Path to a JSON array file
    File(PathBuf),

    /// Caller-supplied provider
    Provider(Arc<dyn DataProvider>),
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Provider(provider) => f
                .debug_tuple("Provider")
                .field(&provider.record_type().unwrap_or("untyped"))
                .finish(),
        }
    }
}

/// Field-name casing applied by a convention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCasing {
    /// `camelCase`
    Camel,
    /// `snake_case`
    Snake,
    /// `PascalCase`
    Pascal,
    /// `kebab-case`
    Kebab,
}

/// Predicate selecting which record types a convention applies to
#[derive(Clone)]
pub struct TypeFilter(FilterKind);

#[derive(Clone)]
enum FilterKind {
    All,
    TypeName(String),
    Predicate(fn(&str) -> bool),
}

impl TypeFilter {
    /// Match every declared record type
    #[must_use]
    pub fn all() -> Self {
        Self(FilterKind::All)
    }

    /// Match exactly the type `T`, by its full type name
    #[must_use]
    pub fn of<T>() -> Self {
        Self(FilterKind::TypeName(std::any::type_name::<T>().to_string()))
    }

    /// Match types for which the predicate returns true
    ///
    /// The predicate receives the full type name, e.g.
    /// `"my_crate::fixtures::Person"`.
    #[must_use]
    pub fn matching(predicate: fn(&str) -> bool) -> Self {
        Self(FilterKind::Predicate(predicate))
    }

    /// Whether the filter matches the given type name
    #[must_use]
    pub fn matches(&self, record_type: &str) -> bool {
        match &self.0 {
            FilterKind::All => true,
            FilterKind::TypeName(name) => name == record_type,
            FilterKind::Predicate(predicate) => predicate(record_type),
        }
    }
}

impl std::fmt::Debug for TypeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            FilterKind::All => f.write_str("TypeFilter::all"),
            FilterKind::TypeName(name) => write!(f, "TypeFilter::of({name})"),
            FilterKind::Predicate(_) => f.write_str("TypeFilter::matching(..)"),
        }
    }
}

/// A named, type-filtered field-naming rule
///
/// Conventions rewrite the top-level field names of a document as it is
/// converted from a typed record. They only ever apply to records whose
/// provider declares a record type; untyped (file-backed) data passes
/// through unchanged.
#[derive(Debug, Clone)]
pub struct Convention {
    name: String,
    casing: FieldCasing,
    filter: TypeFilter,
}

impl Convention {
    /// Create a convention; the name must be non-blank
    pub fn new(
        name: impl Into<String>,
        casing: FieldCasing,
        filter: TypeFilter,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SeedbedError::invalid_argument(
                "name",
                "convention name must not be blank",
            ));
        }
        Ok(Self { name, casing, filter })
    }

    /// Convention name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this convention applies to the given declared record type
    ///
    /// Always false for `None`: untyped records are never rewritten.
    #[must_use]
    pub fn applies_to(&self, record_type: Option<&str>) -> bool {
        record_type.is_some_and(|name| self.filter.matches(name))
    }

    /// Rewrite the top-level field names of a document
    #[must_use]
    pub fn apply(&self, document: crate::store::Document) -> crate::store::Document {
        let case = match self.casing {
            FieldCasing::Camel => Case::Camel,
            FieldCasing::Snake => Case::Snake,
            FieldCasing::Pascal => Case::UpperCamel,
            FieldCasing::Kebab => Case::Kebab,
        };
        document.into_iter().map(|(key, value)| (key.to_case(case), value)).collect()
    }
}

// ---------------------------------------------------------------------------
// Settings file wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default, alias = "Databases")]
    databases: Vec<DatabaseFile>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseFile {
    #[serde(alias = "DatabaseName")]
    database_name: String,

    #[serde(alias = "ConnectionString")]
    connection_string: String,

    #[serde(default, alias = "DatabaseNameSuffix")]
    database_name_suffix: String,

    #[serde(default, alias = "CollectionNameSuffix")]
    collection_name_suffix: String,

    #[serde(default, alias = "DropFirst")]
    drop_first: bool,

    #[serde(default, alias = "Collections")]
    collections: Vec<CollectionFile>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionFile {
    #[serde(alias = "CollectionName")]
    collection_name: String,

    #[serde(alias = "DataFileLocation")]
    data_file_location: String,

    #[serde(default, alias = "DropFirst")]
    drop_first: bool,
}

impl From<ConfigFile> for SeedConfig {
    fn from(file: ConfigFile) -> Self {
        let databases = file
            .databases
            .into_iter()
            .map(|db| DatabaseConfig {
                name: db.database_name,
                connection_target: db.connection_string,
                database_name_suffix: non_blank(db.database_name_suffix),
                collection_name_suffix: non_blank(db.collection_name_suffix),
                drop_first: db.drop_first,
                collections: db
                    .collections
                    .into_iter()
                    .map(|coll| {
                        CollectionConfig::from_data_file(
                            coll.collection_name,
                            coll.data_file_location,
                            coll.drop_first,
                        )
                    })
                    .collect(),
            })
            .collect();

        Self { databases, conventions: Vec::new() }
    }
}

impl TryFrom<&SeedConfig> for ConfigFile {
    type Error = SeedbedError;

    fn try_from(config: &SeedConfig) -> Result<Self> {
        let databases = config
            .databases
            .iter()
            .map(|db| {
                let collections = db
                    .collections
                    .iter()
                    .map(|coll| match &coll.source {
                        DataSource::File(path) => Ok(CollectionFile {
                            collection_name: coll.name.clone(),
                            data_file_location: path.to_string_lossy().into_owned(),
                            drop_first: coll.drop_first,
                        }),
                        DataSource::Provider(_) => Err(SeedbedError::config(format!(
                            "Collection `{}` uses an in-code data provider and cannot be \
                             written to a settings file",
                            coll.name
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;

                Ok(DatabaseFile {
                    database_name: db.name.clone(),
                    connection_string: db.connection_target.clone(),
                    database_name_suffix: db.database_name_suffix.clone().unwrap_or_default(),
                    collection_name_suffix: db.collection_name_suffix.clone().unwrap_or_default(),
                    drop_first: db.drop_first,
                    collections,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { databases })
    }
}

/// Append the suffix only when it is non-blank after trimming
fn apply_suffix(name: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(s) if !s.trim().is_empty() => format!("{name}{s}"),
        _ => name.to_string(),
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
