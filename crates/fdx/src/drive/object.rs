//! 📄 RemoteObject: one folder-listing item, with the JSON:API noise boiled off.
//!
//! ```json
//! {"id": "abc", "attributes": {"type": "folder", "display_html_name": "Reports",
//!   "storage_info": {"size_in_bytes": 0}, "modified_time_in_millisecond": "1700000000000"}}
//! ```
//! Numbers show up as strings about half the time. We take either.

use serde_json::Value;

use crate::error::{FdxError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Folder,
    File,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObject {
    pub id: String,
    pub kind: ObjectKind,
    pub name: String,
    /// 📏 Bytes. Always 0 for folders.
    pub size: u64,
    /// 🕰️ Epoch milliseconds, when the server told us.
    pub last_modified_ms: Option<i64>,
}

impl RemoteObject {
    /// 🏠 The synthetic object for "/", costs zero requests.
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: ObjectKind::Folder,
            name: String::new(),
            size: 0,
            last_modified_ms: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ObjectKind::Folder
    }

    /// 🧩 Parses one listing item. Only `id` is mandatory; everything else has a fallback.
    pub fn from_item(item: &Value, name_attribute: &str) -> Result<Self> {
        let id = match item.get("id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(FdxError::Decode {
                    context: "folder listing item".to_string(),
                    message: format!("item has no usable id: {}", item),
                });
            }
        };
        let attributes = item.get("attributes");
        let attribute = |key: &str| attributes.and_then(|a| a.get(key));

        let kind = match attribute("type").and_then(Value::as_str) {
            Some("folder") => ObjectKind::Folder,
            _ => ObjectKind::File,
        };
        let name = attribute(name_attribute)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let size = match kind {
            ObjectKind::Folder => 0,
            ObjectKind::File => attribute("storage_info")
                .and_then(|s| s.get("size_in_bytes"))
                .and_then(as_u64)
                .unwrap_or(0),
        };
        let last_modified_ms = attribute("modified_time_in_millisecond").and_then(as_i64);

        Ok(Self {
            id,
            kind,
            name,
            size,
            last_modified_ms,
        })
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_stringly_numbers_are_forgiven() -> Result<()> {
        let item = json!({
            "id": "f1",
            "attributes": {
                "type": "writer",
                "display_html_name": "notes.txt",
                "storage_info": {"size_in_bytes": "1234"},
                "modified_time_in_millisecond": "1700000000000"
            }
        });
        let object = RemoteObject::from_item(&item, "display_html_name")?;
        assert_eq!(object.kind, ObjectKind::File);
        assert_eq!(object.name, "notes.txt");
        assert_eq!(object.size, 1234);
        assert_eq!(object.last_modified_ms, Some(1_700_000_000_000));
        Ok(())
    }

    #[test]
    fn the_one_where_folders_weigh_nothing() -> Result<()> {
        let item = json!({
            "id": "d1",
            "attributes": {
                "type": "folder",
                "name": "Reports",
                "storage_info": {"size_in_bytes": 99999},
                "modified_time_in_millisecond": 5
            }
        });
        let object = RemoteObject::from_item(&item, "name")?;
        assert!(object.is_folder());
        assert_eq!(object.size, 0);
        assert_eq!(object.name, "Reports");
        Ok(())
    }

    #[test]
    fn the_one_where_an_item_without_an_id_is_rejected() {
        let result = RemoteObject::from_item(&json!({"attributes": {}}), "name");
        assert!(matches!(result, Err(FdxError::Decode { .. })));
    }
}
