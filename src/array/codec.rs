//! Codecs: pure transforms between array element bytes and stored chunk
//! bytes.
//!
//! A chunk is encoded by one array→bytes codec ([`BytesCodec`] for
//! fixed-size data types, [`VlenUtf8Codec`] for strings) followed by any
//! number of bytes→bytes codecs ([`ZstdCodec`]), composed in a
//! [`CodecChain`]. Encoding applies the codecs in declaration order;
//! decoding applies them in exact reverse.

pub mod array_to_bytes;
pub mod bytes_to_bytes;
mod codec_chain;

pub use array_to_bytes::bytes::{BytesCodec, BytesCodecConfiguration};
pub use array_to_bytes::vlen_utf8::VlenUtf8Codec;
pub use bytes_to_bytes::zstd::{ZstdCodec, ZstdCodecConfiguration};
pub use codec_chain::CodecChain;

use thiserror::Error;

use crate::array_subset::IncompatibleArraySubsetAndShapeError;
use crate::metadata::Metadata;

use super::array_bytes::ArrayBytes;
use super::array_representation::ArrayRepresentation;
use super::bytes_representation::BytesRepresentation;
use super::data_type::DataType;

/// Behaviour common to all codecs.
pub trait CodecTraits: Send + Sync {
    /// Return the metadata (name and configuration) describing this codec.
    fn create_metadata(&self) -> Metadata;
}

/// An array→bytes codec: the first stage of a codec chain.
pub trait ArrayToBytesCodecTraits: CodecTraits + dyn_clone::DynClone + core::fmt::Debug {
    /// Encode the elements of an array with `decoded_representation`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the bytes are incompatible with the
    /// representation or the data type is unsupported.
    fn encode(
        &self,
        bytes: ArrayBytes<'_>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<Vec<u8>, CodecError>;

    /// Decode into the elements of an array with `decoded_representation`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the bytes do not decode to the
    /// representation.
    fn decode(
        &self,
        bytes: Vec<u8>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<ArrayBytes<'static>, CodecError>;

    /// Return the byte representation this codec encodes
    /// `decoded_representation` to.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the data type is unsupported.
    fn compute_encoded_size(
        &self,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<BytesRepresentation, CodecError>;
}

dyn_clone::clone_trait_object!(ArrayToBytesCodecTraits);

/// A bytes→bytes codec: a subsequent stage of a codec chain.
pub trait BytesToBytesCodecTraits: CodecTraits + dyn_clone::DynClone + core::fmt::Debug {
    /// Encode `bytes`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if encoding fails.
    fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode `bytes` with the expected `decoded_representation`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the bytes are malformed.
    fn decode(
        &self,
        bytes: Vec<u8>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<Vec<u8>, CodecError>;

    /// Return the byte representation this codec encodes
    /// `decoded_representation` to.
    fn compute_encoded_size(&self, decoded_representation: &BytesRepresentation)
        -> BytesRepresentation;
}

dyn_clone::clone_trait_object!(BytesToBytesCodecTraits);

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The decoded bytes do not have the expected size.
    #[error("the decoded chunk has {0} bytes, expected {1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// The data type is not supported by the codec.
    #[error("data type {0} is not supported by the {1} codec")]
    UnsupportedDataType(DataType, &'static str),
    /// Expected the bytes of a fixed-size data type.
    #[error("expected fixed-length array bytes")]
    ExpectedFixedLengthBytes,
    /// Expected the bytes of a variable-sized data type.
    #[error("expected variable-length array bytes")]
    ExpectedVariableLengthBytes,
    /// The offsets of a variable-sized array are corrupt or inconsistent.
    #[error("the offsets of the variable-sized array are invalid")]
    InvalidVariableSizedArrayOffsets,
    /// The payload of a string array is not valid UTF-8.
    #[error(transparent)]
    InvalidUtf8(#[from] std::str::Utf8Error),
    /// An array subset is incompatible with an array shape.
    #[error(transparent)]
    IncompatibleArraySubsetAndShape(#[from] IncompatibleArraySubsetAndShapeError),
    /// Any other codec error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// An error creating a codec chain from metadata.
#[derive(Debug, Error)]
pub enum CodecChainCreateError {
    /// The codec name is not in the supported set.
    #[error("codec {0} is not supported")]
    UnsupportedCodec(String),
    /// The chain does not begin with an array→bytes codec.
    #[error("a codec chain must begin with an array to bytes codec")]
    MissingArrayToBytesCodec,
    /// An array→bytes codec appears after the first position.
    #[error("codec {0} must be the first codec in a chain")]
    MisplacedArrayToBytesCodec(String),
    /// A codec configuration failed to deserialize.
    #[error("invalid configuration for codec {name}: {error}")]
    InvalidConfiguration {
        /// The codec name.
        name: String,
        /// The deserialization error.
        error: serde_json::Error,
    },
}
