//! 🌳 DescendantWalker: every file under a folder, depth first, no recursion.
//!
//! The stack holds one frame per folder currently being listed: its path prefix and the
//! reader paging through its children. A folder child pushes a frame; an exhausted reader
//! pops one. Drop the walker and whatever listings were in flight simply stop.
//!
//! ```text
//!   [ ""      | reader(root)  ]   ← bottom
//!   [ "/sub"  | reader(sub)   ]
//!   [ "/sub/x"| reader(x)     ]   ← top, pulled next
//! ```

use futures::Stream;
use tracing::trace;

use super::object::RemoteObject;
use super::resolver::PathResolver;
use crate::error::{FdxError, Result};
use crate::rows::RowReader;

/// 📄 A file found by the walker, with its path relative to where the walk started.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkedFile {
    pub path: String,
    pub object: RemoteObject,
}

#[derive(Debug)]
struct Frame {
    prefix: String,
    reader: RowReader,
}

#[derive(Debug)]
pub struct DescendantWalker {
    resolver: PathResolver,
    stack: Vec<Frame>,
    single: Option<WalkedFile>,
}

impl DescendantWalker {
    pub(crate) fn new(resolver: PathResolver, first: RowReader) -> Self {
        Self {
            resolver,
            stack: vec![Frame {
                prefix: String::new(),
                reader: first,
            }],
            single: None,
        }
    }

    pub(crate) fn single(resolver: PathResolver, file: WalkedFile) -> Self {
        Self {
            resolver,
            stack: Vec::new(),
            single: Some(file),
        }
    }

    /// 📏 Folders currently open on the stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub async fn next_file(&mut self) -> Result<Option<WalkedFile>> {
        if let Some(file) = self.single.take() {
            return Ok(Some(file));
        }
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(item) = frame.reader.next_row().await? else {
                self.stack.pop();
                continue;
            };
            let object = self.resolver.parse_item(&item)?;
            let path = format!("{}/{}", frame.prefix, object.name);
            if object.is_folder() {
                trace!("📂 descending into {}", path);
                let reader = self.resolver.children_reader(&object.id);
                self.stack.push(Frame {
                    prefix: path,
                    reader,
                });
            } else {
                return Ok(Some(WalkedFile { path, object }));
            }
        }
    }

    pub async fn collect_all(mut self) -> Result<Vec<WalkedFile>> {
        let mut files = Vec::new();
        while let Some(file) = self.next_file().await? {
            files.push(file);
        }
        Ok(files)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<WalkedFile>> + Send {
        futures::stream::try_unfold(self, |mut walker| async move {
            let file = walker.next_file().await?;
            Ok::<_, FdxError>(file.map(|file| (file, walker)))
        })
    }
}
