//! 🗄️ DriveFs: stat, browse, enumerate, delete, move, read, write. On paths, not IDs.
//!
//! 🧠 Knowledge graph:
//! - Every facade path is relative to `drive.root_path`, which is itself relative to
//!   `drive.root_folder_id`. `"reports/q1.csv"` → `{root_path}/reports/q1.csv` → walk.
//! - A missing target is part of the contract, not an error: `None`, `Browse::Missing`,
//!   `0` or `false` depending on the call. Transport and remote errors still propagate.
//! - Writes (delete/move/upload) go out exactly once. Reads retry per the client policy.

use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use serde_json::json;
use tracing::{info, warn};

use super::object::RemoteObject;
use super::path::LogicalPath;
use super::resolver::PathResolver;
use super::upload::{ChunkedUploader, UploadOutcome};
use super::{DriveConfig, fill_id};
use crate::error::{FdxError, Result};
use crate::http::{QueryParams, RequestParts, RetryingHttpClient};
use crate::paging::PagingConfig;

/// 📋 What `stat` knows about one path.
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub path: String,
    pub size: u64,
    pub last_modified: Option<i64>,
    pub is_directory: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowseChild {
    pub full_path: String,
    pub is_directory: bool,
    pub size: u64,
    pub last_modified: Option<i64>,
}

/// 📂 A path and, when it is a folder, its direct children.
#[derive(Debug, Clone, PartialEq)]
pub enum Browse {
    Missing,
    Folder {
        path: String,
        last_modified: Option<i64>,
        children: Vec<BrowseChild>,
    },
    File {
        path: String,
        size: u64,
        last_modified: Option<i64>,
    },
}

/// 📄 One file found by `enumerate`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub path: String,
    pub size: u64,
    pub last_modified: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct DriveFs {
    client: Arc<RetryingHttpClient>,
    resolver: PathResolver,
    uploader: ChunkedUploader,
    config: DriveConfig,
    root: LogicalPath,
}

impl DriveFs {
    pub fn new(client: Arc<RetryingHttpClient>, paging: PagingConfig, config: DriveConfig) -> Result<Self> {
        config.validate()?;
        let root = LogicalPath::parse(&config.root_path);
        info!(
            "🗄️ drive facade over folder '{}' rooted at {}",
            config.root_folder_id, root
        );
        Ok(Self {
            resolver: PathResolver::new(Arc::clone(&client), paging, &config),
            uploader: ChunkedUploader::new(Arc::clone(&client), config.upload.clone()),
            client,
            config,
            root,
        })
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    fn full_path(&self, path: &str) -> LogicalPath {
        self.root.join(&LogicalPath::parse(path))
    }

    /// 🔍 Resolve, with "not found" folded into `None`.
    async fn lookup(&self, full: &LogicalPath) -> Result<Option<RemoteObject>> {
        match self.resolver.resolve(&self.config.root_folder_id, full).await {
            Ok(object) => Ok(Some(object)),
            Err(err) if err.is_not_found() => {
                info!("🔍 nothing at {}: {}", full, err);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn require_folder(&self, full: &LogicalPath) -> Result<RemoteObject> {
        let object = self.resolver.resolve(&self.config.root_folder_id, full).await?;
        if !object.is_folder() {
            return Err(FdxError::PathNotFound {
                segment: object.name,
                path: full.to_string(),
            });
        }
        Ok(object)
    }

    pub async fn stat(&self, path: &str) -> Result<Option<Stat>> {
        let full = self.full_path(path);
        info!("📋 stat path={} full_path={}", path, full);
        Ok(self.lookup(&full).await?.map(|object| Stat {
            path: LogicalPath::parse(path).to_string(),
            size: object.size,
            last_modified: object.last_modified_ms,
            is_directory: object.is_folder(),
        }))
    }

    /// 📂 The path itself plus, for folders, its direct children.
    pub async fn browse(&self, path: &str) -> Result<Browse> {
        let full = self.full_path(path);
        info!("📂 browse path={} full_path={}", path, full);
        let Some(object) = self.lookup(&full).await? else {
            return Ok(Browse::Missing);
        };
        let shown = LogicalPath::parse(path);
        if !object.is_folder() {
            return Ok(Browse::File {
                path: shown.to_string(),
                size: object.size,
                last_modified: object.last_modified_ms,
            });
        }
        let children = self
            .resolver
            .children(&object.id)
            .await?
            .into_iter()
            .map(|child| BrowseChild {
                full_path: shown.child(&child.name).to_string(),
                is_directory: child.is_folder(),
                size: child.size,
                last_modified: child.last_modified_ms,
            })
            .collect();
        Ok(Browse::Folder {
            path: shown.to_string(),
            last_modified: object.last_modified_ms,
            children,
        })
    }

    /// 🌳 Every file under `path`, recursively, paths relative to `path`.
    ///
    /// `None` when `path` does not exist. A file path yields just that file.
    /// `first_non_empty` is accepted for interface parity; the full listing is always built.
    pub async fn enumerate(&self, path: &str, first_non_empty: bool) -> Result<Option<Vec<Entry>>> {
        let full = self.full_path(path);
        info!(
            "🌳 enumerate path={} full_path={} first_non_empty={}",
            path, full, first_non_empty
        );
        let Some(object) = self.lookup(&full).await? else {
            return Ok(None);
        };
        if !object.is_folder() {
            return Ok(Some(vec![Entry {
                path: LogicalPath::parse(path).to_string(),
                size: object.size,
                last_modified: object.last_modified_ms,
            }]));
        }
        let entries = self
            .resolver
            .walk_below(&object)
            .into_stream()
            .map_ok(|file| Entry {
                path: file.path,
                size: file.object.size,
                last_modified: file.object.last_modified_ms,
            })
            .try_collect()
            .await?;
        Ok(Some(entries))
    }

    /// 🗑️ Soft delete (moves the item to the trash). Returns the number of *files* deleted.
    pub async fn delete(&self, path: &str) -> Result<u64> {
        let full = self.full_path(path);
        info!("🗑️ delete path={} full_path={}", path, full);
        if full.is_root() {
            warn!("🗑️ refusing to trash the drive root");
            return Ok(0);
        }
        let Some(object) = self.lookup(&full).await? else {
            return Ok(0);
        };
        let body = json!({
            "data": [{
                "attributes": {"status": self.config.trash_status},
                "id": object.id,
                "type": "files"
            }]
        });
        self.client
            .patch_json(&self.config.trash_endpoint, RequestParts::json(body))
            .await?;
        Ok(if object.is_folder() { 0 } else { 1 })
    }

    /// 🚚 Rename and/or re-parent. `false` when `from` does not exist.
    ///
    /// The destination folder is resolved before anything is touched, so a missing (or
    /// file-shaped) destination fails with `PathNotFound` and zero mutating calls.
    pub async fn move_item(&self, from: &str, to: &str) -> Result<bool> {
        let full_from = self.full_path(from);
        let full_to = self.full_path(to);
        info!("🚚 move from={} to={}", full_from, full_to);
        if full_from.is_root() || full_to.is_root() {
            warn!("🚚 refusing to move the drive root (or onto it)");
            return Ok(false);
        }
        let Some(object) = self.lookup(&full_from).await? else {
            return Ok(false);
        };
        let new_parent = if full_from.parent() != full_to.parent() {
            Some(self.require_folder(&full_to.parent()).await?)
        } else {
            None
        };
        let item_target = fill_id(&self.config.item_endpoint, &object.id);

        if full_from.file_name() != full_to.file_name() {
            let new_name = full_to.file_name().unwrap_or_default();
            let body = json!({"data": {"attributes": {"name": new_name}, "type": "files"}});
            self.client
                .patch_json(&item_target, RequestParts::json(body))
                .await?;
        }
        if let Some(new_parent) = new_parent {
            let body = json!({"data": {"attributes": {"parent_id": new_parent.id}, "type": "files"}});
            self.client
                .patch_json(&item_target, RequestParts::json(body))
                .await?;
        }
        Ok(true)
    }

    /// 📥 Downloads the file at `path`, keeping at most `max_bytes` when given.
    pub async fn read(&self, path: &str, max_bytes: Option<usize>) -> Result<Vec<u8>> {
        let full = self.full_path(path);
        info!("📥 read path={} full_path={} limit={:?}", path, full, max_bytes);
        let object = self.resolver.resolve(&self.config.root_folder_id, &full).await?;
        let url = fill_id(&self.config.download_url, &object.id);
        let Some(response) = self.client.get(&url, &QueryParams::new()).await? else {
            warn!("🤫 download of {} gave no response, returning nothing", full);
            return Ok(Vec::new());
        };
        let mut bytes = response.error_for_status()?.body;
        if let Some(limit) = max_bytes {
            bytes.truncate(limit);
        }
        Ok(bytes)
    }

    /// 📤 Uploads `bytes` as the file at `path`. The parent folder must already exist.
    pub async fn write(&self, path: &str, bytes: impl Into<Bytes>) -> Result<UploadOutcome> {
        let bytes = bytes.into();
        let full = self.full_path(path);
        let Some(file_name) = full.file_name() else {
            return Err(FdxError::Config(format!(
                "cannot write to '{}': the path names no file",
                path
            )));
        };
        info!("📤 write path={} full_path={} bytes={}", path, full, bytes.len());
        let parent = self.require_folder(&full.parent()).await?;
        self.uploader.upload(&parent.id, file_name, bytes).await
    }
}
