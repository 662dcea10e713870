//! 🗂️ Drive: a path-addressed filesystem view over a flat, ID-linked files API.
//!
//! 🧠 Knowledge graph:
//! - `path`: `LogicalPath`, the slash-separated thing humans type.
//! - `object`: `RemoteObject`, one item from a folder listing, normalized.
//! - `resolver`: walks a `LogicalPath` one segment at a time, listing children as it goes.
//! - `walker`: depth-first enumeration of every file under a folder, explicit stack.
//! - `upload`: one-shot stream upload, or create → append → commit for the big ones.
//! - `fs`: `DriveFs`, the stat/browse/enumerate/delete/move/read/write facade on top.
//!
//! Nothing here caches. Every call walks from the root again. The remote is the truth.

use serde::{Deserialize, Serialize};

use crate::error::{FdxError, Result};

pub mod fs;
pub mod object;
pub mod path;
pub mod resolver;
pub mod upload;
pub mod walker;

pub use fs::{Browse, BrowseChild, DriveFs, Entry, Stat};
pub use object::{ObjectKind, RemoteObject};
pub use path::LogicalPath;
pub use resolver::PathResolver;
pub use upload::{ChunkedUploader, UploadConfig, UploadOutcome, UploadPhase};
pub use walker::{DescendantWalker, WalkedFile};

const ID_PLACEHOLDER: &str = "{id}";

/// 🗂️ Where the drive lives and how to talk to it. Defaults match WorkDrive.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DriveConfig {
    /// 📁 Folder ID every path is resolved from. `me` = the caller's own space.
    pub root_folder_id: String,
    /// 📁 Logical prefix under that folder; every facade path is relative to it.
    pub root_path: String,
    pub children_endpoint: String,
    pub item_endpoint: String,
    pub trash_endpoint: String,
    /// 🗑️ Status value that means "in the trash".
    pub trash_status: String,
    /// 🏷️ Attribute compared against path segments.
    pub name_attribute: String,
    pub download_url: String,
    pub upload: UploadConfig,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            root_folder_id: "me".to_string(),
            root_path: String::new(),
            children_endpoint: "files/{id}/files".to_string(),
            item_endpoint: "files/{id}".to_string(),
            trash_endpoint: "files".to_string(),
            trash_status: "51".to_string(),
            name_attribute: "display_html_name".to_string(),
            download_url: "https://download.zoho.com/v1/workdrive/download/{id}".to_string(),
            upload: UploadConfig::default(),
        }
    }
}

impl DriveConfig {
    /// 🔧 Every `{id}` template must actually contain `{id}`.
    pub fn validate(&self) -> Result<()> {
        for (name, template) in [
            ("children_endpoint", &self.children_endpoint),
            ("item_endpoint", &self.item_endpoint),
            ("download_url", &self.download_url),
        ] {
            if !template.contains(ID_PLACEHOLDER) {
                return Err(FdxError::Config(format!(
                    "drive.{} must contain {}: got '{}'",
                    name, ID_PLACEHOLDER, template
                )));
            }
        }
        if self.root_folder_id.trim().is_empty() {
            return Err(FdxError::Config("drive.root_folder_id is empty".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn fill_id(template: &str, id: &str) -> String {
    template.replace(ID_PLACEHOLDER, id)
}
