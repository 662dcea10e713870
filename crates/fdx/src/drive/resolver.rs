//! 🔍 PathResolver: turns `/a/b/c` into the object with that name, one listing at a time.
//!
//! 🧠 Knowledge graph:
//! - The remote only knows IDs. To find `/a/b`, list the root's children, scan for `a`,
//!   list `a`'s children, scan for `b`. Each listing is a full paginated read.
//! - Middle segments must be folders. The last one may be a file.
//! - The scan stops at the first match, so later pages of a big folder are never fetched.
//! - `/` costs nothing: a synthetic root built from the configured folder ID.
//!
//! ⚠️ No caching. A path resolved twice is walked twice. Renames elsewhere stay visible.

use std::sync::Arc;

use tracing::{debug, info};

use super::object::RemoteObject;
use super::path::LogicalPath;
use super::walker::{DescendantWalker, WalkedFile};
use super::{DriveConfig, fill_id};
use crate::endpoint::EndpointDescriptor;
use crate::error::{FdxError, Result};
use crate::http::RetryingHttpClient;
use crate::paging::PagingConfig;
use crate::rows::RowReader;

#[derive(Debug, Clone)]
pub struct PathResolver {
    client: Arc<RetryingHttpClient>,
    paging: PagingConfig,
    children_endpoint: String,
    name_attribute: String,
}

impl PathResolver {
    pub fn new(client: Arc<RetryingHttpClient>, paging: PagingConfig, config: &DriveConfig) -> Self {
        Self {
            client,
            paging,
            children_endpoint: config.children_endpoint.clone(),
            name_attribute: config.name_attribute.clone(),
        }
    }

    /// 🚰 A lazy reader over the direct children of `folder_id`.
    pub fn children_reader(&self, folder_id: &str) -> RowReader {
        let endpoint = EndpointDescriptor::new(fill_id(&self.children_endpoint, folder_id))
            .with_data_keys(["data"]);
        RowReader::new(Arc::clone(&self.client), endpoint, &self.paging)
    }

    pub fn parse_item(&self, item: &serde_json::Value) -> Result<RemoteObject> {
        RemoteObject::from_item(item, &self.name_attribute)
    }

    /// 📂 Every direct child of `folder_id`, in listing order.
    pub async fn children(&self, folder_id: &str) -> Result<Vec<RemoteObject>> {
        let mut reader = self.children_reader(folder_id);
        let mut children = Vec::new();
        while let Some(item) = reader.next_row().await? {
            children.push(self.parse_item(&item)?);
        }
        Ok(children)
    }

    /// 🔎 First child named `name`. Folders always qualify; files only with `can_be_file`.
    pub async fn find_child(
        &self,
        folder_id: &str,
        name: &str,
        can_be_file: bool,
    ) -> Result<Option<RemoteObject>> {
        let mut reader = self.children_reader(folder_id);
        while let Some(item) = reader.next_row().await? {
            let child = self.parse_item(&item)?;
            if (child.is_folder() || can_be_file) && child.name == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// 🔍 Resolves `path` below `root_id`. The last segment may name a file.
    pub async fn resolve(&self, root_id: &str, path: &LogicalPath) -> Result<RemoteObject> {
        self.walk(root_id, path, true).await
    }

    async fn walk(
        &self,
        root_id: &str,
        path: &LogicalPath,
        last_may_be_file: bool,
    ) -> Result<RemoteObject> {
        let mut current = RemoteObject::root(root_id);
        let segments = path.segments();
        for (index, segment) in segments.iter().enumerate() {
            let is_last = index + 1 == segments.len();
            debug!("🔍 looking for '{}' in {}", segment, current.id);
            current = self
                .find_child(&current.id, segment, is_last && last_may_be_file)
                .await?
                .ok_or_else(|| FdxError::PathNotFound {
                    segment: segment.clone(),
                    path: path.to_string(),
                })?;
        }
        Ok(current)
    }

    /// 🌳 A walker over everything below an already-resolved folder.
    pub fn walk_below(&self, folder: &RemoteObject) -> DescendantWalker {
        DescendantWalker::new(self.clone(), self.children_reader(&folder.id))
    }

    /// 🌳 `folder/` → every file below `folder`, depth first, with paths relative to it.
    ///
    /// With a trailing slash the last segment must be a folder. Without one, a file is fine
    /// and the walker yields just that file.
    pub async fn resolve_and_enumerate_trailing_wildcard(
        &self,
        root_id: &str,
        path: &LogicalPath,
    ) -> Result<DescendantWalker> {
        let target = self.walk(root_id, path, !path.has_trailing_slash()).await?;
        info!("🌳 enumerating below {} ({})", path, target.id);
        if target.is_folder() {
            Ok(self.walk_below(&target))
        } else {
            let single = WalkedFile {
                path: format!("/{}", target.name),
                object: target,
            };
            Ok(DescendantWalker::single(self.clone(), single))
        }
    }
}
