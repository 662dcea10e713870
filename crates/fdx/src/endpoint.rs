//! 🧭 Endpoint descriptors: where to GET, which fixed params to send, where the rows live.
//!
//! A descriptor is immutable once built. Tables get one from config; folder listings build
//! one on the fly (`files/{id}/files`, rows under `data`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::QueryParams;

/// 🗺️ The key (or chain of keys) that leads from a response body to its rows.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DataPath {
    Key(String),
    Keys(Vec<String>),
}

impl DataPath {
    fn keys(&self) -> &[String] {
        match self {
            DataPath::Key(key) => std::slice::from_ref(key),
            DataPath::Keys(keys) => keys,
        }
    }
}

/// 🧭 `{path, data_path, params}`: one row source.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EndpointDescriptor {
    /// 🔗 Relative to the profile base URL, or a full `http(s)://` URL.
    pub path: String,
    #[serde(default)]
    pub data_path: Option<DataPath>,
    #[serde(default)]
    pub params: QueryParams,
}

impl EndpointDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            data_path: None,
            params: QueryParams::new(),
        }
    }

    pub fn with_data_key(mut self, key: impl Into<String>) -> Self {
        self.data_path = Some(DataPath::Key(key.into()));
        self
    }

    pub fn with_data_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_path = Some(DataPath::Keys(keys.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// 📦 Pulls the rows out of one page body, following `data_path`.
    ///
    /// Missing key (or `null`) anywhere along the path = empty page. An array yields its
    /// elements; anything else is a single row.
    pub fn extract_rows(&self, body: Value) -> Vec<Value> {
        let mut located = body;
        if let Some(path) = &self.data_path {
            for key in path.keys() {
                located = match located {
                    Value::Object(mut map) => match map.remove(key) {
                        Some(inner) => inner,
                        None => return Vec::new(),
                    },
                    _ => return Vec::new(),
                };
            }
        }
        match located {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            single => vec![single],
        }
    }
}
