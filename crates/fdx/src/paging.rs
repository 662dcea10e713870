//! 📄 Paging strategies: "is there more?" and "how do I ask for it?"
//!
//! 🧠 Knowledge graph:
//! - Pattern: trait → concrete impls (`OffsetLimitPaging`, `PageTokenPaging`, `SinglePage`)
//!   → `PagingBackend` enum that dispatches by `match`. Same casting-agency shape as sources.
//! - `has_next_page` is called before *every* fetch, including the first one (with `None`),
//!   which doubles as "reset your cursor, a new read just started".
//! - `build_params` is called right after a `true` and advances the cursor as a side effect.
//! - Cursor state is owned by exactly one reader. `&mut self` everywhere. No sharing, no locks.
//! - `PagingConfig` is the serializable recipe; `start()` bakes a fresh strategy per read session.
//!
//! 🦆 Three strategies. The duck has a fourth in mind. The duck has not filed a design doc.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::QueryParams;

pub mod offset_limit;
pub mod page_token;
pub mod single_page;

pub use offset_limit::{OffsetLimitConfig, OffsetLimitPaging};
pub use page_token::{PageTokenConfig, PageTokenPaging};
pub use single_page::SinglePage;

/// 📄 Decides whether another page exists and how to ask for it.
///
/// # Contract 📜
/// - `has_next_page(None, 0)` starts a read session: reset cursor, usually return `true`.
/// - `has_next_page(Some(body), n)` looks at the last page body and how many rows it produced.
/// - `build_params(current)` returns the params for the next request, advancing the cursor.
pub trait PagingStrategy: std::fmt::Debug + Send {
    fn has_next_page(&mut self, last_page: Option<&Value>, items_in_last_page: usize) -> bool;
    fn build_params(&mut self, current: QueryParams) -> QueryParams;
}

/// 🧾 The recipe for a paging strategy, as it appears in config.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PagingConfig {
    /// 📄 One request, everything in it. Done.
    #[default]
    SinglePage,
    /// 🔢 `page[limit]` + `page[offset]`; a short page means the end.
    OffsetLimit(OffsetLimitConfig),
    /// 🎟️ An `info` envelope with `page` and `more_records`.
    PageToken(PageTokenConfig),
}

impl PagingConfig {
    pub fn offset_limit(batch_size: usize) -> Self {
        PagingConfig::OffsetLimit(OffsetLimitConfig {
            batch_size,
            ..OffsetLimitConfig::default()
        })
    }

    pub fn page_token() -> Self {
        PagingConfig::PageToken(PageTokenConfig::default())
    }

    /// 🚀 A brand-new cursor for one read session.
    pub fn start(&self) -> PagingBackend {
        match self {
            PagingConfig::SinglePage => PagingBackend::SinglePage(SinglePage::new()),
            PagingConfig::OffsetLimit(config) => {
                PagingBackend::OffsetLimit(OffsetLimitPaging::new(config.clone()))
            }
            PagingConfig::PageToken(config) => {
                PagingBackend::PageToken(PageTokenPaging::new(config.clone()))
            }
        }
    }
}

/// 🎭 The many faces of pagination, dispatched by `match` so readers never care which.
#[derive(Debug)]
pub enum PagingBackend {
    SinglePage(SinglePage),
    OffsetLimit(OffsetLimitPaging),
    PageToken(PageTokenPaging),
}

impl PagingStrategy for PagingBackend {
    fn has_next_page(&mut self, last_page: Option<&Value>, items_in_last_page: usize) -> bool {
        match self {
            PagingBackend::SinglePage(p) => p.has_next_page(last_page, items_in_last_page),
            PagingBackend::OffsetLimit(p) => p.has_next_page(last_page, items_in_last_page),
            PagingBackend::PageToken(p) => p.has_next_page(last_page, items_in_last_page),
        }
    }

    fn build_params(&mut self, current: QueryParams) -> QueryParams {
        match self {
            PagingBackend::SinglePage(p) => p.build_params(current),
            PagingBackend::OffsetLimit(p) => p.build_params(current),
            PagingBackend::PageToken(p) => p.build_params(current),
        }
    }
}
