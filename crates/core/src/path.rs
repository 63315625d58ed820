use std::fmt;

/// A directory position in the local tree. The root is its own variant so
/// child paths never pick up a `./` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirPath {
    Root,
    Rel(String),
}

impl DirPath {
    /// Accepts `.`, the empty string, and relative paths. Leading and
    /// trailing slashes are dropped.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim_matches('/');
        if trimmed.is_empty() || trimmed == "." {
            DirPath::Root
        } else {
            DirPath::Rel(trimmed.to_string())
        }
    }

    /// Backend-relative listing prefix: the root lists as the empty prefix.
    pub fn as_prefix(&self) -> &str {
        match self {
            DirPath::Root => "",
            DirPath::Rel(p) => p,
        }
    }

    /// Path of a child named `name` directly under this directory.
    pub fn child(&self, name: &str) -> String {
        match self {
            DirPath::Root => name.to_string(),
            DirPath::Rel(p) => format!("{p}/{name}"),
        }
    }
}

impl fmt::Display for DirPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirPath::Root => write!(f, "."),
            DirPath::Rel(p) => write!(f, "{p}"),
        }
    }
}

/// Remote destination for a local PDF path. The directory portion has every
/// literal `pdf` substring removed and is joined to the unchanged file name
/// with no extra separator: `a/pdf/report.pdf` becomes `a/report.pdf`.
/// Directory names that merely contain `pdf` (such as `pdfs`) are rewritten
/// too; that substring semantic is kept deliberately.
pub fn normalize_remote_path(local_path: &str) -> String {
    match local_path.rsplit_once('/') {
        Some((dir, base)) => format!("{}{base}", dir.replace("pdf", "")),
        None => local_path.to_string(),
    }
}
