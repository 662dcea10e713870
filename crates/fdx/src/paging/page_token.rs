//! 🎟️ Page-token paging: the server tells us, in an `info` block, whether there is more.
//!
//! ```json
//! "info": {"per_page": 200, "page": 1, "more_records": false, "next_page_token": null, ...}
//! ```
//!
//! `more_records: false` is final, token or no token. The page number only advances when the
//! previous response actually carried one; no page field, no increment.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::PagingStrategy;
use crate::http::QueryParams;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PageTokenConfig {
    /// 📦 Where the envelope lives in the response body.
    #[serde(default = "default_info_key")]
    pub info_key: String,
    /// 🔢 Query parameter that carries the page number.
    #[serde(default = "default_page_param")]
    pub page_param: String,
    /// 🎟️ When set, the last seen `next_page_token` is also sent under this name.
    #[serde(default)]
    pub token_param: Option<String>,
}

fn default_info_key() -> String {
    "info".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

impl Default for PageTokenConfig {
    fn default() -> Self {
        Self {
            info_key: default_info_key(),
            page_param: default_page_param(),
            token_param: None,
        }
    }
}

/// 🎟️ Cursor: last seen page number and last seen continuation token.
#[derive(Debug)]
pub struct PageTokenPaging {
    config: PageTokenConfig,
    last_page: Option<u64>,
    last_token: Option<String>,
}

impl PageTokenPaging {
    pub fn new(config: PageTokenConfig) -> Self {
        Self {
            config,
            last_page: None,
            last_token: None,
        }
    }
}

// 🔢 Pages arrive as numbers, or as numeric strings when the API is feeling creative.
fn as_page_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl PagingStrategy for PageTokenPaging {
    fn has_next_page(&mut self, last_page: Option<&Value>, _items_in_last_page: usize) -> bool {
        let Some(body) = last_page else {
            debug!("🎟️ page-token paging: initialisation");
            self.last_page = None;
            self.last_token = None;
            return true;
        };
        let info = body.get(&self.config.info_key);
        self.last_token = info
            .and_then(|i| i.get("next_page_token"))
            .and_then(Value::as_str)
            .map(str::to_string);
        self.last_page = info.and_then(|i| i.get("page")).and_then(as_page_number);
        let more = info
            .and_then(|i| i.get("more_records"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        debug!(
            "🎟️ page={:?} more_records={} token_present={}",
            self.last_page,
            more,
            self.last_token.is_some()
        );
        more
    }

    fn build_params(&mut self, mut current: QueryParams) -> QueryParams {
        if let Some(page) = self.last_page {
            current.insert(self.config.page_param.clone(), (page + 1).to_string());
        }
        if let (Some(param), Some(token)) = (&self.config.token_param, &self.last_token) {
            current.insert(param.clone(), token.clone());
        }
        current
    }
}
