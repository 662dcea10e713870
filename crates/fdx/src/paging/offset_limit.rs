//! 🔢 Offset/limit paging: ask for `batch_size` at a time, stop at the first short page.
//!
//! The provider sends no metadata at all. The only end-of-data signal is a page with fewer
//! rows than we asked for. If the total is an exact multiple of the batch size, that means
//! one extra request that comes back empty. Costs one round trip. We've made peace with it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::PagingStrategy;
use crate::http::QueryParams;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OffsetLimitConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_limit_param")]
    pub limit_param: String,
    #[serde(default = "default_offset_param")]
    pub offset_param: String,
}

fn default_batch_size() -> usize {
    50
}

fn default_limit_param() -> String {
    "page[limit]".to_string()
}

fn default_offset_param() -> String {
    "page[offset]".to_string()
}

impl Default for OffsetLimitConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            limit_param: default_limit_param(),
            offset_param: default_offset_param(),
        }
    }
}

/// 🔢 Cursor: a zero-based page offset that ticks up once per request.
#[derive(Debug)]
pub struct OffsetLimitPaging {
    config: OffsetLimitConfig,
    page_offset: u64,
}

impl OffsetLimitPaging {
    pub fn new(mut config: OffsetLimitConfig) -> Self {
        // ⚠️ A batch of zero would page forever. One is the smallest honest batch.
        config.batch_size = config.batch_size.max(1);
        Self {
            config,
            page_offset: 0,
        }
    }
}

impl PagingStrategy for OffsetLimitPaging {
    fn has_next_page(&mut self, last_page: Option<&Value>, items_in_last_page: usize) -> bool {
        if last_page.is_none() {
            debug!("🔢 offset/limit paging: initialisation");
            self.page_offset = 0;
            return true;
        }
        // 📏 Short page (including an empty one) = end of data.
        items_in_last_page >= self.config.batch_size
    }

    fn build_params(&mut self, mut current: QueryParams) -> QueryParams {
        current.insert(
            self.config.limit_param.clone(),
            self.config.batch_size.to_string(),
        );
        current.insert(
            self.config.offset_param.clone(),
            self.page_offset.to_string(),
        );
        self.page_offset += 1;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// 🧪 Drives the strategy against a fake dataset of `total` rows and counts the requests.
    fn requests_for(total: usize, batch_size: usize) -> usize {
        let mut paging = OffsetLimitPaging::new(OffsetLimitConfig {
            batch_size,
            ..OffsetLimitConfig::default()
        });
        let mut remaining = total;
        let mut last_page: Option<Value> = None;
        let mut items = 0;
        let mut requests = 0;
        while paging.has_next_page(last_page.as_ref(), items) {
            paging.build_params(QueryParams::new());
            requests += 1;
            items = remaining.min(batch_size);
            remaining -= items;
            last_page = Some(json!({"data": []}));
            assert!(requests < 10_000, "💀 paging ran away from home");
        }
        requests
    }

    #[test]
    fn the_one_where_exact_multiples_pay_for_one_empty_page() {
        assert_eq!(requests_for(4, 2), 3);
        assert_eq!(requests_for(100, 50), 3);
        assert_eq!(requests_for(0, 50), 1);
    }

    #[test]
    fn the_one_where_a_short_page_ends_the_party_on_time() {
        assert_eq!(requests_for(3, 2), 2);
        assert_eq!(requests_for(1, 50), 1);
        assert_eq!(requests_for(101, 50), 3);
    }

    #[test]
    fn the_one_where_params_carry_limit_and_a_ticking_offset() {
        let mut paging = OffsetLimitPaging::new(OffsetLimitConfig {
            batch_size: 25,
            ..OffsetLimitConfig::default()
        });
        assert!(paging.has_next_page(None, 0));

        let mut fixed = QueryParams::new();
        fixed.insert("fields".into(), "name".into());
        let first = paging.build_params(fixed);
        assert_eq!(first["page[limit]"], "25");
        assert_eq!(first["page[offset]"], "0");
        assert_eq!(first["fields"], "name");

        let second = paging.build_params(first);
        assert_eq!(second["page[offset]"], "1");

        // 🔄 A new session (None) rewinds the cursor.
        assert!(paging.has_next_page(None, 0));
        assert_eq!(paging.build_params(QueryParams::new())["page[offset]"], "0");
    }

    #[test]
    fn the_one_where_batch_size_zero_is_politely_ignored() {
        let mut paging = OffsetLimitPaging::new(OffsetLimitConfig {
            batch_size: 0,
            ..OffsetLimitConfig::default()
        });
        assert!(paging.has_next_page(None, 0));
        assert_eq!(paging.build_params(QueryParams::new())["page[limit]"], "1");
        assert!(!paging.has_next_page(Some(&json!({})), 0));
    }
}
