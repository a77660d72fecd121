//! Hierarchy node paths.

use derive_more::Display;
use thiserror::Error;

/// A hierarchy node path, e.g. `/temperature`.
///
/// A path always starts with `/`, a non-root path does not end with `/`, and
/// node names are non-empty.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub struct NodePath(String);

/// An invalid node path.
#[derive(Debug, Error)]
#[error("invalid node path {0}")]
pub struct NodePathError(String);

impl NodePath {
    /// Create a new node path from `path`.
    ///
    /// # Errors
    /// Returns [`NodePathError`] if `path` is not valid according to
    /// [`NodePath::validate()`].
    pub fn new(path: &str) -> Result<Self, NodePathError> {
        if Self::validate(path) {
            Ok(Self(path.to_string()))
        } else {
            Err(NodePathError(path.to_string()))
        }
    }

    /// The root node.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Extracts a string slice of the underlying path [`String`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validates a path: it must start with `/`, a non-root path must not end
    /// with `/`, and it must not contain empty node names (a `//` substring).
    #[must_use]
    pub fn validate(path: &str) -> bool {
        path.eq("/") || (path.starts_with('/') && !path.ends_with('/') && !path.contains("//"))
    }
}

impl TryFrom<&str> for NodePath {
    type Error = NodePathError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path_validation() {
        assert!(NodePath::new("/").is_ok());
        assert!(NodePath::new("/a").is_ok());
        assert!(NodePath::new("/a/b").is_ok());
        assert!(NodePath::new("a").is_err());
        assert!(NodePath::new("/a/").is_err());
        assert!(NodePath::new("/a//b").is_err());
        assert!(NodePath::new("").is_err());
    }
}
