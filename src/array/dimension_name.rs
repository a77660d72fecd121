//! Dimension names.

use derive_more::From;
use serde::{Deserialize, Serialize};

/// An optional dimension name.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, Default, From)]
pub struct DimensionName(Option<String>);

impl DimensionName {
    /// Create a new dimension with `name`. Use
    /// [`default`](DimensionName::default) to create a dimension with no name.
    #[must_use]
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self(Some(name.into()))
    }

    /// Get the dimension name as a [`&str`], or [`None`] if the dimension has
    /// no name.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl From<&str> for DimensionName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for DimensionName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&String> for DimensionName {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_name() {
        let dimension_name: DimensionName = "x".into();
        assert_eq!(dimension_name.as_str(), Some("x"));
        assert!(DimensionName::default().as_str().is_none());
    }

    #[test]
    fn dimension_name_serde() {
        assert_eq!(
            serde_json::to_string(&DimensionName::new("y")).unwrap(),
            r#""y""#
        );
        assert_eq!(
            serde_json::to_string(&DimensionName::default()).unwrap(),
            "null"
        );
    }
}
