//! 🚀 fdx: paged record reads and a path-addressed drive over SaaS object APIs.
//!
//! 🧠 Knowledge graph:
//! - `http`: transport seam + `RetryingHttpClient` (GET-only retries, auth, logging).
//! - `paging`: offset/limit, page-token and single-page strategies behind one trait.
//! - `rows`: `RowReader`, the lazy page-by-page row pull (and its `Stream` form).
//! - `tables`: named endpoint descriptors for the records family.
//! - `drive`: path resolution, recursive walking, chunked uploads, and the `DriveFs` facade.
//! - `app_config`: figment-loaded `AppConfig` that wires all of the above together.
//!
//! 🦆 The duck handles auth. The duck does not handle auth. Bring your own token.

pub mod app_config;
pub mod drive;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod paging;
pub mod provider;
pub mod redact;
pub mod rows;
pub mod tables;

pub use app_config::{AppConfig, load_config};
pub use drive::{Browse, DriveConfig, DriveFs, Entry, LogicalPath, Stat, UploadOutcome};
pub use endpoint::{DataPath, EndpointDescriptor};
pub use error::{FdxError, Result};
pub use http::{RetryConfig, RetryingHttpClient};
pub use paging::{PagingConfig, PagingStrategy};
pub use provider::{Credentials, EndpointFamily, ProviderProfile};
pub use redact::Redactor;
pub use rows::{RowLimit, RowReader};
pub use tables::TableCatalog;
