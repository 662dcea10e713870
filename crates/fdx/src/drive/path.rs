use std::fmt;

/// 🛤️ A slash-separated path, relative to some root folder.
///
/// Leading, trailing and doubled slashes collapse; empty segments vanish. The one thing kept
/// from the raw text is whether it ended in `/`, because `folder/` means "everything inside".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogicalPath {
    segments: Vec<String>,
    trailing_slash: bool,
}

impl LogicalPath {
    pub fn parse(raw: &str) -> Self {
        let segments: Vec<String> = raw
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let trailing_slash = !segments.is_empty() && raw.ends_with('/');
        Self {
            segments,
            trailing_slash,
        }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn has_trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    /// 🔗 `self` + `other`. The trailing slash comes from `other`.
    pub fn join(&self, other: &LogicalPath) -> LogicalPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        let trailing_slash = if other.is_root() {
            self.trailing_slash
        } else {
            other.trailing_slash
        };
        LogicalPath {
            segments,
            trailing_slash,
        }
    }

    pub fn child(&self, name: &str) -> LogicalPath {
        self.join(&LogicalPath::parse(name))
    }

    /// ⬆️ Everything but the last segment. The root is its own parent.
    pub fn parent(&self) -> LogicalPath {
        let mut segments = self.segments.clone();
        segments.pop();
        LogicalPath {
            segments,
            trailing_slash: false,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
