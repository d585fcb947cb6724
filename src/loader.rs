//! Record loaders: resolve request parameters into records.
//!
//! A loader is configured with the column to match on and the name of the
//! request parameter supplying the value (both default to `"id"`). Loading
//! is a pure read: a miss is `Ok(None)`, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::PermbaseResult;
use crate::record::Record;

pub const DEFAULT_PARAM: &str = "id";

/// Inbound request parameters, as flattened by the host framework.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    values: HashMap<String, String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Column and parameter names a loader matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub column: String,
    pub param: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            column: DEFAULT_PARAM.to_string(),
            param: DEFAULT_PARAM.to_string(),
        }
    }
}

impl LoaderConfig {
    pub fn new(column: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            param: param.into(),
        }
    }
}

/// Find-one-by-column abstraction over a storage backend.
pub trait Loader: Send + Sync {
    /// First record matching the configured column, or `None`.
    fn load(&self, params: &RequestParams) -> PermbaseResult<Option<Arc<dyn Record>>>;
}
