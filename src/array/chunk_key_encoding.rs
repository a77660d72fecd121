//! Chunk key encoding: mapping chunk grid indices to store keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::storage::store_key::StoreKey;

/// The separator between chunk grid indices in a chunk key.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ChunkKeySeparator {
    /// `/` separator.
    #[default]
    Slash,
    /// `.` separator.
    Dot,
}

impl core::fmt::Display for ChunkKeySeparator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Slash => f.write_str("/"),
            Self::Dot => f.write_str("."),
        }
    }
}

impl Serialize for ChunkKeySeparator {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Slash => s.serialize_char('/'),
            Self::Dot => s.serialize_char('.'),
        }
    }
}

impl<'de> Deserialize<'de> for ChunkKeySeparator {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let separator = String::deserialize(d)?;
        match separator.as_str() {
            "/" => Ok(Self::Slash),
            "." => Ok(Self::Dot),
            _ => Err(serde::de::Error::custom(
                "the chunk key separator must be `/` or `.`",
            )),
        }
    }
}

/// The default chunk key encoding: keys of the form `c/0/1/2` (or `c.0.1.2`
/// with the dot separator) below the array prefix. A zero dimensional array
/// has the single chunk key `c`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl ChunkKeyEncoding {
    /// Create a chunk key encoding with `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// The separator.
    #[must_use]
    pub const fn separator(&self) -> ChunkKeySeparator {
        self.separator
    }

    /// Encode `chunk_grid_indices` to a store key relative to the array
    /// prefix.
    #[must_use]
    pub fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey {
        let mut key = "c".to_string();
        for index in chunk_grid_indices {
            key.push_str(&self.separator.to_string());
            key.push_str(&index.to_string());
        }
        // SAFETY: the key is non-empty and has no leading or trailing `/`
        unsafe { StoreKey::new_unchecked(key) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_key_slash() {
        let encoding = ChunkKeyEncoding::default();
        assert_eq!(encoding.encode(&[1, 23, 45]).as_str(), "c/1/23/45");
    }

    #[test]
    fn chunk_key_dot() {
        let encoding = ChunkKeyEncoding::new(ChunkKeySeparator::Dot);
        assert_eq!(encoding.encode(&[1, 23, 45]).as_str(), "c.1.23.45");
    }

    #[test]
    fn chunk_key_scalar() {
        let encoding = ChunkKeyEncoding::default();
        assert_eq!(encoding.encode(&[]).as_str(), "c");
    }

    #[test]
    fn chunk_key_separator_serde() {
        assert_eq!(serde_json::to_string(&ChunkKeySeparator::Dot).unwrap(), r#"".""#);
        let separator: ChunkKeySeparator = serde_json::from_str(r#""/""#).unwrap();
        assert_eq!(separator, ChunkKeySeparator::Slash);
        assert!(serde_json::from_str::<ChunkKeySeparator>(r#""-""#).is_err());
    }
}
