//! Data Providers
//!
//! A data provider feeds a collection its record set at provisioning time.
//! Two implementations ship with seedbed:
//! - [`JsonFileProvider`]: reads a JSON array from a file, one record per
//!   array element. The file is validated and re-read on every fetch.
//! - [`TypedProvider`]: wraps caller-supplied values that serialize to JSON
//!   objects, carrying their Rust type name for convention matching.
//!
//! # Fetch Semantics
//! `fetch` may be called more than once. File-backed providers pick up
//! changes made to the file between calls; typed providers return the same
//! records every time.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, SeedbedError};
use crate::store::Document;

/// Source of records for one collection
pub trait DataProvider: Send + Sync {
    /// Declared type of the records, used to match conventions
    ///
    /// Returns `None` for untyped sources such as files. Conventions only
    /// apply to records whose provider declares a type.
    fn record_type(&self) -> Option<&str> {
        None
    }

    /// Produce the record set
    ///
    /// An empty set is legal and results in no insert.
    fn fetch(&self) -> Result<Vec<Document>>;
}

/// File-backed provider reading a JSON array of objects
///
/// Validation happens at fetch time, not construction, so a provider can
/// be configured before its data file exists. The path must point to an
/// existing `.json` file containing a top-level JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    /// Create a provider for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this provider reads from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataProvider for JsonFileProvider {
    fn fetch(&self) -> Result<Vec<Document>> {
        let display = self.path.display();

        if !self.path.is_file() {
            return Err(SeedbedError::data_source(format!(
                "Error validating file `{display}`: file does not exist"
            )));
        }

        // Extension check runs after the existence check so a missing file
        // reports the more useful error.
        let extension = self.path.extension().and_then(std::ffi::OsStr::to_str);
        if extension != Some("json") {
            return Err(SeedbedError::data_source(format!(
                "Invalid file type for `{display}`: file must be a .json file"
            )));
        }

        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            SeedbedError::data_source(format!("Failed to read data file `{display}`: {e}"))
        })?;

        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
            SeedbedError::data_source(format!("Invalid JSON in data file `{display}`: {e}"))
        })?;

        let items = match value {
            serde_json::Value::Array(items) => items,
            _ => {
                return Err(SeedbedError::data_source(format!(
                    "Data file `{display}` must contain a top-level JSON array"
                )))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                serde_json::Value::Object(map) => Ok(map),
                _ => Err(SeedbedError::data_source(format!(
                    "Data file `{display}` element {index} is not a JSON object"
                ))),
            })
            .collect()
    }
}

/// Provider wrapping caller-supplied typed records
///
/// Each record must serialize to a JSON object. The provider reports
/// `std::any::type_name::<T>()` as its record type, which is what
/// conventions filter against.
#[derive(Debug, Clone)]
pub struct TypedProvider<T> {
    records: Vec<T>,
}

impl<T> TypedProvider<T> {
    /// Wrap the given records
    pub fn new(records: Vec<T>) -> Self {
        Self { records }
    }
}

impl<T: Serialize + Send + Sync> DataProvider for TypedProvider<T> {
    fn record_type(&self) -> Option<&str> {
        Some(std::any::type_name::<T>())
    }

    fn fetch(&self) -> Result<Vec<Document>> {
        self.records
            .iter()
            .map(|record| {
                let value = serde_json::to_value(record).map_err(|e| {
                    SeedbedError::data_source(format!(
                        "Failed to serialize record of type `{}`: {e}",
                        std::any::type_name::<T>()
                    ))
                })?;
                match value {
                    serde_json::Value::Object(map) => Ok(map),
                    _ => Err(SeedbedError::data_source(format!(
                        "Record of type `{}` did not serialize to a JSON object",
                        std::any::type_name::<T>()
                    ))),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_data_file(extension: &str, contents: &str) -> PathBuf {
        let id = FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir()
            .join(format!("seedbed_provider_{}_{id}.{extension}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[derive(Serialize)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn test_json_file_provider_reads_array() {
        let path = temp_data_file("json", r#"[{"name": "Ray", "age": 32}, {"name": "Egon", "age": 33}]"#);

        let provider = JsonFileProvider::new(&path);
        let records = provider.fetch().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["name"], "Ray");
        assert_eq!(records[1]["age"], 33);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_json_file_provider_has_no_record_type() {
        let provider = JsonFileProvider::new("data/people.json");
        assert_eq!(provider.record_type(), None);
    }

    #[test]
    fn test_missing_file_is_a_validation_error() {
        let provider = JsonFileProvider::new("/nonexistent/path/people.json");
        let err = provider.fetch().unwrap_err();

        assert_eq!(err.error_code(), "DATA_SOURCE");
        assert!(err.message().contains("does not exist"));
        assert!(err.message().contains("people.json"));
    }

    #[test]
    fn test_wrong_extension_is_a_distinct_error() {
        let path = temp_data_file("txt", r#"[{"name": "Ray"}]"#);

        let provider = JsonFileProvider::new(&path);
        let err = provider.fetch().unwrap_err();

        assert_eq!(err.error_code(), "DATA_SOURCE");
        assert!(err.message().contains("must be a .json file"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_malformed_json_fails() {
        let path = temp_data_file("json", r#"[{"name": "Ray""#);

        let provider = JsonFileProvider::new(&path);
        let err = provider.fetch().unwrap_err();

        assert_eq!(err.error_code(), "DATA_SOURCE");
        assert!(err.message().contains("Invalid JSON"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_top_level_object_is_rejected() {
        let path = temp_data_file("json", r#"{"name": "Ray"}"#);

        let provider = JsonFileProvider::new(&path);
        let err = provider.fetch().unwrap_err();

        assert!(err.message().contains("top-level JSON array"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_non_object_element_is_rejected() {
        let path = temp_data_file("json", r#"[{"name": "Ray"}, 42]"#);

        let provider = JsonFileProvider::new(&path);
        let err = provider.fetch().unwrap_err();

        assert!(err.message().contains("element 1"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_empty_array_yields_empty_record_set() {
        let path = temp_data_file("json", "[]");

        let provider = JsonFileProvider::new(&path);
        assert!(provider.fetch().unwrap().is_empty());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_file_is_reread_on_every_fetch() {
        let path = temp_data_file("json", r#"[{"n": 1}]"#);
        let provider = JsonFileProvider::new(&path);

        assert_eq!(provider.fetch().unwrap().len(), 1);

        std::fs::write(&path, r#"[{"n": 1}, {"n": 2}]"#).unwrap();
        assert_eq!(provider.fetch().unwrap().len(), 2);
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_typed_provider_reports_type_name() {
        let provider = TypedProvider::new(vec![Person { name: "Ray".into(), age: 32 }]);
        let record_type = provider.record_type().unwrap();
        assert!(record_type.ends_with("Person"));
    }

    #[test]
    fn test_typed_provider_serializes_in_order() {
        let provider = TypedProvider::new(vec![
            Person { name: "Peter Venkman".into(), age: 31 },
            Person { name: "Ray Stantz".into(), age: 32 },
            Person { name: "Egon Spengler".into(), age: 33 },
        ]);

        let records = provider.fetch().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["name"], "Peter Venkman");
        assert_eq!(records[1]["name"], "Ray Stantz");
        assert_eq!(records[2]["age"], 33);
    }

    #[test]
    fn test_typed_provider_rejects_non_object_records() {
        let provider = TypedProvider::new(vec![1, 2, 3]);
        let err = provider.fetch().unwrap_err();

        assert_eq!(err.error_code(), "DATA_SOURCE");
        assert!(err.message().contains("JSON object"));
    }

    #[test]
    fn test_typed_provider_fetch_is_repeatable() {
        let provider = TypedProvider::new(vec![Person { name: "Ray".into(), age: 32 }]);
        assert_eq!(provider.fetch().unwrap(), provider.fetch().unwrap());
    }
}
