//! Metadata with a name and optional configuration, and array metadata.
//!
//! [`Metadata`] represents the name/configuration JSON structure used for
//! codecs in array metadata. [`ArrayMetadata`] is the JSON document stored at
//! the `zarr.json` key below an array prefix.

use std::num::NonZeroU64;

use serde::{de::DeserializeOwned, ser::SerializeMap, Deserialize, Serialize};

use crate::array::chunk_key_encoding::ChunkKeySeparator;
use crate::array::dimension_name::DimensionName;

/// A metadata configuration: a JSON object.
pub type MetadataConfiguration = serde_json::Map<String, serde_json::Value>;

/// Metadata with a name and optional configuration.
///
/// Can be deserialised from a JSON string or a name/configuration map, e.g.
/// ```json
/// "vlen-utf8"
/// ```
/// or
/// ```json
/// { "name": "bytes", "configuration": { "endian": "little" } }
/// ```
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Metadata {
    name: String,
    configuration: Option<MetadataConfiguration>,
}

impl core::fmt::Display for Metadata {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if let Some(configuration) = &self.configuration {
            write!(f, "{} {configuration:?}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl serde::Serialize for Metadata {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if let Some(configuration) = &self.configuration {
            let mut s = s.serialize_map(Some(2))?;
            s.serialize_entry("name", &self.name)?;
            s.serialize_entry("configuration", configuration)?;
            s.end()
        } else {
            s.serialize_str(self.name.as_str())
        }
    }
}

impl<'de> serde::Deserialize<'de> for Metadata {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct MetadataNameConfiguration {
            name: String,
            #[serde(default)]
            configuration: Option<MetadataConfiguration>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum MetadataIntermediate {
            Name(String),
            NameConfiguration(MetadataNameConfiguration),
        }

        match MetadataIntermediate::deserialize(d)? {
            MetadataIntermediate::Name(name) => Ok(Self {
                name,
                configuration: None,
            }),
            MetadataIntermediate::NameConfiguration(metadata) => Ok(Self {
                name: metadata.name,
                configuration: metadata.configuration,
            }),
        }
    }
}

impl Metadata {
    /// Create metadata from `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            configuration: None,
        }
    }

    /// Create metadata from `name` and `configuration`.
    #[must_use]
    pub fn new_with_configuration(name: &str, configuration: MetadataConfiguration) -> Self {
        Self {
            name: name.into(),
            configuration: Some(configuration),
        }
    }

    /// Convert a serializable configuration to [`Metadata`].
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if `configuration` does not serialize to
    /// a JSON object.
    pub fn new_with_serializable_configuration<TConfiguration: Serialize>(
        name: &str,
        configuration: &TConfiguration,
    ) -> Result<Self, serde_json::Error> {
        let configuration = serde_json::to_value(configuration)?;
        let serde_json::Value::Object(configuration) = configuration else {
            return Err(serde::ser::Error::custom(
                "codec configuration must serialize to a JSON object",
            ));
        };
        Ok(Self::new_with_configuration(name, configuration))
    }

    /// Try and convert the configuration of this metadata to
    /// `TConfiguration`.
    ///
    /// # Errors
    /// Returns [`serde_json::Error`] if the configuration is absent or does
    /// not match `TConfiguration`.
    pub fn to_configuration<TConfiguration: DeserializeOwned>(
        &self,
    ) -> Result<TConfiguration, serde_json::Error> {
        let configuration = self.configuration.clone().unwrap_or_default();
        serde_json::from_value(serde_json::Value::Object(configuration))
    }

    /// Returns the metadata name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the metadata configuration.
    #[must_use]
    pub const fn configuration(&self) -> Option<&MetadataConfiguration> {
        self.configuration.as_ref()
    }
}

/// The metadata of an array, stored at the `zarr.json` key below the array
/// prefix.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ArrayMetadata {
    /// The shape of the array.
    pub shape: Vec<u64>,
    /// The data type name.
    pub data_type: String,
    /// The chunk shape of the regular chunk grid.
    pub chunk_shape: Vec<NonZeroU64>,
    /// The chunk key separator.
    #[serde(default)]
    pub chunk_key_separator: ChunkKeySeparator,
    /// The fill value, or [`None`] for the data type default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<serde_json::Value>,
    /// The codec chain metadata, in encode order.
    pub codecs: Vec<Metadata>,
    /// The optional dimension names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_names: Option<Vec<DimensionName>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_name_only() {
        let metadata: Metadata = serde_json::from_str(r#""vlen-utf8""#).unwrap();
        assert_eq!(metadata.name(), "vlen-utf8");
        assert!(metadata.configuration().is_none());
        assert_eq!(serde_json::to_string(&metadata).unwrap(), r#""vlen-utf8""#);
    }

    #[test]
    fn metadata_name_configuration() {
        let metadata: Metadata =
            serde_json::from_str(r#"{"name":"bytes","configuration":{"endian":"big"}}"#).unwrap();
        assert_eq!(metadata.name(), "bytes");
        assert!(metadata.configuration().is_some());
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"bytes","configuration":{"endian":"big"}}"#
        );
    }

    #[test]
    fn array_metadata_round_trip() {
        let json = r#"{
            "shape": [8, 8],
            "data_type": "float32",
            "chunk_shape": [4, 4],
            "chunk_key_separator": "/",
            "fill_value": 0.0,
            "codecs": [{"name": "bytes", "configuration": {"endian": "little"}}],
            "dimension_names": ["y", "x"]
        }"#;
        let metadata: ArrayMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.shape, vec![8, 8]);
        assert_eq!(metadata.data_type, "float32");
        assert_eq!(metadata.chunk_key_separator, ChunkKeySeparator::Slash);
        let round_trip: ArrayMetadata =
            serde_json::from_str(&serde_json::to_string(&metadata).unwrap()).unwrap();
        assert_eq!(round_trip, metadata);
    }

    #[test]
    fn array_metadata_defaults() {
        let json = r#"{
            "shape": [4],
            "data_type": "int32",
            "chunk_shape": [2],
            "codecs": ["vlen-utf8"]
        }"#;
        let metadata: ArrayMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.chunk_key_separator, ChunkKeySeparator::Slash);
        assert!(metadata.fill_value.is_none());
        assert!(metadata.dimension_names.is_none());
    }

    #[test]
    fn array_metadata_rejects_zero_chunk_shape() {
        let json = r#"{
            "shape": [4],
            "data_type": "int32",
            "chunk_shape": [0],
            "codecs": ["bytes"]
        }"#;
        assert!(serde_json::from_str::<ArrayMetadata>(json).is_err());
    }
}
