//! Page-data access for variable output
//!
//! The renderer treats page data as an opaque read-only object that answers
//! dotted-path lookups with text. A stock implementation is provided for TOML
//! values so page data can be loaded from a file.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::template::DataPath;

/// Errors reported by a page-data source
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataAccessError {
    /// No value at the requested path
    #[error("missing page data key '{path}'")]
    MissingKey { path: String },

    /// Value exists but is a table or array
    #[error("page data at '{path}' is not a scalar value")]
    NotScalar { path: String },
}

/// Read-only page data consulted by `Var` nodes and hooks
pub trait PageData {
    /// Look up `path` and return its text form
    fn lookup(&self, path: &DataPath) -> Result<String, DataAccessError>;
}

/// Page data with no keys at all
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyData;

impl PageData for EmptyData {
    fn lookup(&self, path: &DataPath) -> Result<String, DataAccessError> {
        Err(DataAccessError::MissingKey {
            path: path.to_string(),
        })
    }
}

impl PageData for toml::Value {
    fn lookup(&self, path: &DataPath) -> Result<String, DataAccessError> {
        let mut current = self;
        for segment in path.segments() {
            let next = match current {
                toml::Value::Table(table) => table.get(segment),
                toml::Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| DataAccessError::MissingKey {
                path: path.to_string(),
            })?;
        }
        scalar_text(current).ok_or_else(|| DataAccessError::NotScalar {
            path: path.to_string(),
        })
    }
}

impl PageData for toml::Table {
    fn lookup(&self, path: &DataPath) -> Result<String, DataAccessError> {
        let missing = || DataAccessError::MissingKey {
            path: path.to_string(),
        };
        let (first, rest) = path.segments().split_first().ok_or_else(missing)?;
        let value = self.get(first).ok_or_else(missing)?;
        let rest = DataPath::parse(&rest.join("."));
        value.lookup(&rest).map_err(|err| match err {
            DataAccessError::MissingKey { .. } => missing(),
            DataAccessError::NotScalar { .. } => DataAccessError::NotScalar {
                path: path.to_string(),
            },
        })
    }
}

/// Flat map keyed by full dotted path
impl PageData for HashMap<String, String> {
    fn lookup(&self, path: &DataPath) -> Result<String, DataAccessError> {
        let key = path.to_string();
        self.get(&key)
            .cloned()
            .ok_or(DataAccessError::MissingKey { path: key })
    }
}

fn scalar_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

/// Errors that can occur when loading page data from disk
#[derive(Error, Debug)]
pub enum PageDataError {
    #[error("Failed to read page data file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse page data TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Load page data from a TOML file
pub fn load_page_data(path: &Path) -> Result<toml::Table, PageDataError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
