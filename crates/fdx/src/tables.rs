//! 📇 Table catalog: friendly names for record endpoints.
//!
//! Four tables ship built in. Config can add more, or override a built-in by reusing its name.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::endpoint::EndpointDescriptor;
use crate::error::{FdxError, Result};
use crate::http::RetryingHttpClient;
use crate::paging::PagingConfig;
use crate::rows::{RowLimit, RowReader};

#[derive(Debug, Clone, PartialEq)]
pub struct TableCatalog {
    tables: BTreeMap<String, EndpointDescriptor>,
}

impl Default for TableCatalog {
    fn default() -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(
            "contacts".to_string(),
            EndpointDescriptor::new("Contacts")
                .with_data_keys(["data"])
                .with_param("fields", "Last_Name,Email"),
        );
        tables.insert(
            "apis".to_string(),
            EndpointDescriptor::new("__apis").with_data_keys(["__apis"]),
        );
        tables.insert(
            "users".to_string(),
            EndpointDescriptor::new("users").with_data_keys(["users"]),
        );
        tables.insert(
            "events".to_string(),
            EndpointDescriptor::new("Events")
                .with_data_keys(["data"])
                .with_param("fields", "Owner,Venue,Description"),
        );
        Self { tables }
    }
}

impl TableCatalog {
    /// 📇 Built-ins, then `extra` on top. Same name = the configured one wins.
    pub fn with_overrides(extra: &BTreeMap<String, EndpointDescriptor>) -> Self {
        let mut catalog = Self::default();
        for (name, endpoint) in extra {
            debug!("📇 table '{}' -> {}", name, endpoint.path);
            catalog.tables.insert(name.to_ascii_lowercase(), endpoint.clone());
        }
        catalog
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// 🔍 Case-insensitive lookup. Unknown names are a config problem, not a 404.
    pub fn get(&self, name: &str) -> Result<&EndpointDescriptor> {
        self.tables.get(&name.to_ascii_lowercase()).ok_or_else(|| {
            let known: Vec<&str> = self.names().collect();
            FdxError::Config(format!(
                "unknown table '{}' (known: {})",
                name,
                known.join(", ")
            ))
        })
    }

    /// 🚰 A ready-to-pull reader for the named table.
    pub fn reader(
        &self,
        name: &str,
        client: Arc<RetryingHttpClient>,
        paging: &PagingConfig,
        limit: RowLimit,
    ) -> Result<RowReader> {
        let endpoint = self.get(name)?.clone();
        Ok(RowReader::new(client, endpoint, paging).with_limit(limit))
    }
}
