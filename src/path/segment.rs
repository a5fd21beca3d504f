//! Typed path segments and the dot-string wire format.

use crate::error::PathError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// String that denotes "replace the whole value".
pub const ROOT_PATH: &str = ".";

/// One step into a tree: a map key or a sequence index.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    /// Classify a single wire segment. All-digit segments are indices.
    pub fn parse(segment: &str) -> Self {
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = segment.parse() {
                return PathSegment::Index(index);
            }
        }
        PathSegment::Key(segment.to_string())
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(index) => Some(*index),
            PathSegment::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }
}

impl fmt::Debug for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Key(key) => write!(f, "{:?}", key),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{}", index),
            PathSegment::Key(key) => write!(f, "{}", key),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

/// Ordered list of segments addressing a location in a tree.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Parse a dot-separated path such as `debates.2.ballot`.
    ///
    /// The empty string is the root path. Use [`PatchTarget::parse`] for
    /// strings that may be the whole-value sentinel `.`.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() {
            return Ok(Path::root());
        }
        s.split('.')
            .map(|segment| {
                if segment.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(PathSegment::parse(segment))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Path)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Return a new path with `segment` appended.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Path without its first `n` segments.
    pub fn skip(&self, n: usize) -> Self {
        Path(self.0.iter().skip(n).cloned().collect())
    }

    pub fn get(&self, position: usize) -> Option<&PathSegment> {
        self.0.get(position)
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Path(segments)
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl AsRef<[PathSegment]> for Path {
    fn as_ref(&self) -> &[PathSegment] {
        &self.0
    }
}

/// Where a single patch writes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PatchTarget {
    /// Replace the whole snapshot.
    Root,
    Path(Path),
}

impl PatchTarget {
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s == ROOT_PATH {
            return Ok(PatchTarget::Root);
        }
        if s.is_empty() {
            return Err(PathError::EmptySegment(s.to_string()));
        }
        Path::parse(s).map(PatchTarget::Path)
    }

    /// Number of segments; the root has depth zero.
    pub fn depth(&self) -> usize {
        match self {
            PatchTarget::Root => 0,
            PatchTarget::Path(path) => path.len(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        match self {
            PatchTarget::Root => &[],
            PatchTarget::Path(path) => path.segments(),
        }
    }
}

impl fmt::Display for PatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchTarget::Root => f.write_str(ROOT_PATH),
            PatchTarget::Path(path) => write!(f, "{}", path),
        }
    }
}

impl FromStr for PatchTarget {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatchTarget::parse(s)
    }
}

/// Build a [`Path`] from mixed keys and indices.
///
/// ```ignore
/// let p = path!["debates", 2usize, "ballot"];
/// ```
#[macro_export]
macro_rules! path {
    () => { $crate::path::Path::root() };
    ($($segment:expr),+ $(,)?) => {
        $crate::path::Path::from(vec![$($crate::path::PathSegment::from($segment)),+])
    };
}
