// ── Store paths ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A normalized, slash-delimited location in the remote tree.
///
/// Leading, trailing and repeated slashes are dropped, so
/// `"/smartLight//state/"` and `"smartLight/state"` are the same path.
/// Segments may contain spaces (`First Floor/Cabin 1`). The empty path
/// is the root of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StorePath(String);

impl StorePath {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let joined = raw
            .as_ref()
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Append a child path.
    pub fn join(&self, child: impl AsRef<str>) -> Self {
        Self::new(format!("{}/{}", self.0, child.as_ref()))
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(
            self.0
                .rsplit_once('/')
                .map_or_else(Self::root, |(head, _)| Self(head.to_owned())),
        )
    }

    /// Final segment, `None` at the root.
    pub fn key(&self) -> Option<&str> {
        self.0.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Segments of `other` below `self`, or `None` when `other` is not
    /// at or under `self`. Equal paths give an empty list.
    pub fn relative<'a>(&self, other: &'a StorePath) -> Option<Vec<&'a str>> {
        let mine: Vec<&str> = self.segments().collect();
        let theirs: Vec<&'a str> = other.segments().collect();
        if theirs.len() < mine.len() || theirs[..mine.len()] != mine[..] {
            return None;
        }
        Some(theirs[mine.len()..].to_vec())
    }

    /// `true` when `other` is this path or lies beneath it.
    pub fn contains(&self, other: &StorePath) -> bool {
        self.relative(other).is_some()
    }

    /// `true` when one path contains the other.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.contains(other) || other.contains(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("/")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for StorePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StorePath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&StorePath> for StorePath {
    fn from(p: &StorePath) -> Self {
        p.clone()
    }
}

impl FromStr for StorePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl AsRef<str> for StorePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for StorePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StorePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}
