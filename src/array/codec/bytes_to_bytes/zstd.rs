//! The `zstd` bytes→bytes codec: Zstandard compression.

use serde::{Deserialize, Serialize};

use crate::array::bytes_representation::BytesRepresentation;
use crate::metadata::Metadata;

use super::super::{BytesToBytesCodecTraits, CodecError, CodecTraits};

/// The identifier of the `zstd` codec.
pub const IDENTIFIER: &str = "zstd";

const DEFAULT_LEVEL: i32 = 1;

/// Configuration parameters for the `zstd` codec.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ZstdCodecConfiguration {
    /// The compression level.
    #[serde(default = "default_level")]
    pub level: i32,
}

const fn default_level() -> i32 {
    DEFAULT_LEVEL
}

impl Default for ZstdCodecConfiguration {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
        }
    }
}

/// The `zstd` codec.
#[derive(Clone, Copy, Debug)]
pub struct ZstdCodec {
    level: i32,
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

impl ZstdCodec {
    /// Create a new `zstd` codec with compression `level`.
    #[must_use]
    pub const fn new(level: i32) -> Self {
        Self { level }
    }

    /// Create a new `zstd` codec from a configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ZstdCodecConfiguration) -> Self {
        Self::new(configuration.level)
    }
}

impl CodecTraits for ZstdCodec {
    fn create_metadata(&self) -> Metadata {
        let configuration = ZstdCodecConfiguration { level: self.level };
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .expect("zstd configuration is serializable")
    }
}

impl BytesToBytesCodecTraits for ZstdCodec {
    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        zstd::encode_all(bytes.as_slice(), self.level).map_err(CodecError::from)
    }

    fn decode(
        &self,
        bytes: Vec<u8>,
        _decoded_representation: &BytesRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        zstd::decode_all(bytes.as_slice()).map_err(CodecError::from)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        match decoded_representation {
            BytesRepresentation::FixedSize(size) | BytesRepresentation::BoundedSize(size) => {
                // the zstd compress bound for a worst-case incompressible input
                let margin = size / 256 + if *size < 131_072 { (131_072 - size) >> 11 } else { 0 };
                BytesRepresentation::BoundedSize(size + margin + 64)
            }
            BytesRepresentation::UnboundedSize => BytesRepresentation::UnboundedSize,
        }
    }
}
