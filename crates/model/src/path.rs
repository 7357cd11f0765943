//! Absolute paths into the model tree and the hierarchical store.
//!
//! Paths are `/`-separated and always absolute: `/modeltree/network/cell0`.
//! The empty path (`/`) is the root. The cross-reference linker leans on the
//! prefix algebra here: [`common_prefix`] finds the closest common ancestor
//! of a set of node paths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An absolute, `/`-separated path.
///
/// Paths are immutable and support efficient comparison and hashing. They
/// are used as keys in the uid→path index and for addressing store objects.
///
/// # Examples
///
/// ```
/// # use dendrite_model::Path;
/// let path = Path::from("/network/cell0/soma");
/// assert_eq!(path.segments(), &["network", "cell0", "soma"]);
/// assert_eq!(path.to_string(), "/network/cell0/soma");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Create a path from a vector of segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// The root path (`/`).
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Parse a path from a `/`-separated string. Leading and trailing
    /// slashes are ignored, so `"/a/b"`, `"a/b"` and `"a/b/"` are the same
    /// path.
    pub fn parse(s: &str) -> Self {
        Self {
            segments: s
                .split('/')
                .filter(|seg| !seg.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Get the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the last segment (leaf name).
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Append a segment to create a new path.
    pub fn append(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::new(segments)
    }

    /// Get the parent path. Returns `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Self::new(self.segments[..self.segments.len() - 1].to_vec()))
        }
    }

    /// Check if this path starts with another path. Every path starts with
    /// the root.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Strip `prefix` from the front of this path, returning the remaining
    /// segments. Returns `None` if `prefix` is not a prefix of this path.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<&[String]> {
        if self.starts_with(prefix) {
            Some(&self.segments[prefix.segments.len()..])
        } else {
            None
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "/")
        } else {
            for seg in &self.segments {
                write!(f, "/{seg}")?;
            }
            Ok(())
        }
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Path {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

/// Longest common prefix of a set of paths.
///
/// This is the path of the closest common ancestor: the deepest node whose
/// subtree contains every input path. An empty input, or inputs with no
/// shared leading segment, yield the root path.
pub fn common_prefix<'a, I>(paths: I) -> Path
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut iter = paths.into_iter();
    let first = match iter.next() {
        Some(p) => p,
        None => return Path::root(),
    };
    let mut shared = first.segments.clone();
    for path in iter {
        let matched = shared
            .iter()
            .zip(path.segments())
            .take_while(|(a, b)| *a == *b)
            .count();
        shared.truncate(matched);
        if shared.is_empty() {
            break;
        }
    }
    Path::new(shared)
}
