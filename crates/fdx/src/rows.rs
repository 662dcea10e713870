//! 🚰 RowReader: turns "GET a page, look for more, GET again" into one row at a time.
//!
//! 🧠 Knowledge graph:
//! - Pull-based. Nothing is fetched until somebody asks for a row; then exactly one page.
//! - Owns its `PagingBackend` by value. Two readers never share a cursor.
//! - Shares the `RetryingHttpClient` (and its connection pool) through an `Arc`.
//! - Ends when: the strategy says no, the row cap is hit, or the client gave up silently.
//! - Drop it and the requests stop. Restart = build a new one.
//!
//! ```text
//!   next_row ──► buffer has rows? ──yes──► pop one
//!                    │ no
//!                    ▼
//!           has_next_page? ──no──► None
//!                    │ yes
//!                    ▼
//!           build_params → GET → extract_rows → buffer
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use futures::Stream;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::endpoint::EndpointDescriptor;
use crate::error::{FdxError, Result};
use crate::http::{QueryParams, RetryingHttpClient};
use crate::paging::{PagingBackend, PagingConfig, PagingStrategy};

/// 🧢 How many rows a read may hand out. Config speaks `-1` for "no cap".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "i64")]
pub enum RowLimit {
    #[default]
    Unlimited,
    AtMost(u64),
}

impl RowLimit {
    /// 🔢 Negative means unlimited; anything else is a hard cap.
    pub fn from_sentinel(value: i64) -> Self {
        u64::try_from(value).map_or(RowLimit::Unlimited, RowLimit::AtMost)
    }

    fn reached(&self, emitted: u64) -> bool {
        match self {
            RowLimit::Unlimited => false,
            RowLimit::AtMost(cap) => emitted >= *cap,
        }
    }
}

impl From<i64> for RowLimit {
    fn from(value: i64) -> Self {
        Self::from_sentinel(value)
    }
}

/// 🚰 A lazy, single-owner reader over one paginated endpoint.
#[derive(Debug)]
pub struct RowReader {
    client: Arc<RetryingHttpClient>,
    endpoint: EndpointDescriptor,
    paging: PagingBackend,
    limit: RowLimit,
    params: QueryParams,
    buffer: VecDeque<Value>,
    last_page: Option<Value>,
    items_in_last_page: usize,
    emitted: u64,
    pages_fetched: u64,
    finished: bool,
}

impl RowReader {
    pub fn new(
        client: Arc<RetryingHttpClient>,
        endpoint: EndpointDescriptor,
        paging: &PagingConfig,
    ) -> Self {
        let params = endpoint.params.clone();
        Self {
            client,
            endpoint,
            paging: paging.start(),
            limit: RowLimit::Unlimited,
            params,
            buffer: VecDeque::new(),
            last_page: None,
            items_in_last_page: 0,
            emitted: 0,
            pages_fetched: 0,
            finished: false,
        }
    }

    pub fn with_limit(mut self, limit: RowLimit) -> Self {
        self.limit = limit;
        self
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// 🚰 The next row, fetching a page only when the buffer runs dry.
    pub async fn next_row(&mut self) -> Result<Option<Value>> {
        loop {
            if self.limit.reached(self.emitted) {
                if !self.finished {
                    debug!("🧢 row cap reached after {} row(s) from {}", self.emitted, self.endpoint.path);
                }
                self.finished = true;
                return Ok(None);
            }
            if let Some(row) = self.buffer.pop_front() {
                self.emitted += 1;
                return Ok(Some(row));
            }
            if self.finished {
                return Ok(None);
            }
            if let Err(err) = self.fetch_page().await {
                // 💀 A failed read stays failed. No half-resumed cursors.
                self.finished = true;
                return Err(err);
            }
        }
    }

    async fn fetch_page(&mut self) -> Result<()> {
        if !self
            .paging
            .has_next_page(self.last_page.as_ref(), self.items_in_last_page)
        {
            info!(
                "🏁 {} done: {} page(s), {} row(s)",
                self.endpoint.path, self.pages_fetched, self.emitted
            );
            self.finished = true;
            return Ok(());
        }
        self.params = self.paging.build_params(std::mem::take(&mut self.params));

        let Some(response) = self.client.get(&self.endpoint.path, &self.params).await? else {
            warn!("🤫 no response for {}, ending the read quietly", self.endpoint.path);
            self.finished = true;
            return Ok(());
        };
        let body = response.error_for_status()?.json()?;
        let rows = self.endpoint.extract_rows(body.clone());
        self.pages_fetched += 1;
        self.items_in_last_page = rows.len();
        debug!(
            "📄 page {} of {}: {} row(s)",
            self.pages_fetched,
            self.endpoint.path,
            rows.len()
        );
        self.last_page = Some(body);
        self.buffer.extend(rows);
        Ok(())
    }

    /// 📦 Drains the whole read into memory. Fine for folder listings, think twice for tables.
    pub async fn collect_all(mut self) -> Result<Vec<Value>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next_row().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// 🌊 The same read as a `futures::Stream`. Dropping the stream stops the requests.
    pub fn into_stream(self) -> impl Stream<Item = Result<Value>> + Send {
        futures::stream::try_unfold(self, |mut reader| async move {
            let row = reader.next_row().await?;
            Ok::<_, FdxError>(row.map(|row| (row, reader)))
        })
    }
}
