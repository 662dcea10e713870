use serde_json::Value;

use super::PagingStrategy;
use crate::http::QueryParams;

/// 📄 One page, then silence. For endpoints that hand over everything in a single response.
#[derive(Debug, Default)]
pub struct SinglePage {
    fetched: bool,
}

impl SinglePage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PagingStrategy for SinglePage {
    fn has_next_page(&mut self, _last_page: Option<&Value>, _items_in_last_page: usize) -> bool {
        // 🎯 First call says yes. Every call after that says no. Like a one-time coupon.
        !std::mem::replace(&mut self.fetched, true)
    }

    fn build_params(&mut self, current: QueryParams) -> QueryParams {
        current
    }
}
