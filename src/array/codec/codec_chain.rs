//! An ordered sequence of codecs forming an encoding pipeline.

use crate::array::array_bytes::ArrayBytes;
use crate::array::array_representation::ArrayRepresentation;
use crate::array::bytes_representation::BytesRepresentation;
use crate::metadata::Metadata;

use super::array_to_bytes::{bytes, vlen_utf8};
use super::bytes_to_bytes::zstd;
use super::{
    ArrayToBytesCodecTraits, BytesCodec, BytesCodecConfiguration, BytesToBytesCodecTraits,
    CodecChainCreateError, CodecError, VlenUtf8Codec, ZstdCodec, ZstdCodecConfiguration,
};

/// A codec chain: exactly one array→bytes codec followed by zero or more
/// bytes→bytes codecs.
///
/// Encoding applies the array→bytes codec then each bytes→bytes codec in
/// order. Decoding applies the inverses in reverse order.
#[derive(Clone, Debug)]
pub struct CodecChain {
    array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
}

impl CodecChain {
    /// Create a new codec chain.
    #[must_use]
    pub fn new(
        array_to_bytes: Box<dyn ArrayToBytesCodecTraits>,
        bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> Self {
        Self {
            array_to_bytes,
            bytes_to_bytes,
        }
    }

    /// Create a codec chain from a list of codec metadata.
    ///
    /// # Errors
    /// Returns a [`CodecChainCreateError`] if a codec name is unrecognised, a
    /// configuration is invalid, or the metadata does not describe exactly one
    /// array→bytes codec followed by bytes→bytes codecs.
    pub fn from_metadata(metadatas: &[Metadata]) -> Result<Self, CodecChainCreateError> {
        let mut array_to_bytes: Option<Box<dyn ArrayToBytesCodecTraits>> = None;
        let mut bytes_to_bytes: Vec<Box<dyn BytesToBytesCodecTraits>> = Vec::new();
        for metadata in metadatas {
            match metadata.name() {
                bytes::IDENTIFIER => {
                    if array_to_bytes.is_some() {
                        return Err(CodecChainCreateError::MisplacedArrayToBytesCodec(
                            metadata.name().to_string(),
                        ));
                    }
                    let configuration: BytesCodecConfiguration = metadata
                        .to_configuration()
                        .map_err(|error| CodecChainCreateError::InvalidConfiguration {
                            name: metadata.name().to_string(),
                            error,
                        })?;
                    array_to_bytes =
                        Some(Box::new(BytesCodec::new_with_configuration(&configuration)));
                }
                vlen_utf8::IDENTIFIER => {
                    if array_to_bytes.is_some() {
                        return Err(CodecChainCreateError::MisplacedArrayToBytesCodec(
                            metadata.name().to_string(),
                        ));
                    }
                    array_to_bytes = Some(Box::new(VlenUtf8Codec::new()));
                }
                zstd::IDENTIFIER => {
                    if array_to_bytes.is_none() {
                        return Err(CodecChainCreateError::MisplacedArrayToBytesCodec(
                            metadata.name().to_string(),
                        ));
                    }
                    let configuration: ZstdCodecConfiguration = metadata
                        .to_configuration()
                        .map_err(|error| CodecChainCreateError::InvalidConfiguration {
                            name: metadata.name().to_string(),
                            error,
                        })?;
                    bytes_to_bytes.push(Box::new(ZstdCodec::new_with_configuration(
                        &configuration,
                    )));
                }
                name => return Err(CodecChainCreateError::UnsupportedCodec(name.to_string())),
            }
        }
        let array_to_bytes = array_to_bytes.ok_or(CodecChainCreateError::MissingArrayToBytesCodec)?;
        Ok(Self::new(array_to_bytes, bytes_to_bytes))
    }

    /// The array→bytes codec.
    #[must_use]
    pub fn array_to_bytes_codec(&self) -> &dyn ArrayToBytesCodecTraits {
        self.array_to_bytes.as_ref()
    }

    /// The bytes→bytes codecs.
    #[must_use]
    pub fn bytes_to_bytes_codecs(&self) -> &[Box<dyn BytesToBytesCodecTraits>] {
        &self.bytes_to_bytes
    }

    /// Create the codec chain metadata, in encode order.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<Metadata> {
        let mut metadatas = Vec::with_capacity(1 + self.bytes_to_bytes.len());
        metadatas.push(self.array_to_bytes.create_metadata());
        for codec in &self.bytes_to_bytes {
            metadatas.push(codec.create_metadata());
        }
        metadatas
    }

    /// Encode chunk bytes through the chain.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if any stage fails.
    pub fn encode(
        &self,
        bytes: ArrayBytes<'_>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let mut bytes = self.array_to_bytes.encode(bytes, decoded_representation)?;
        for codec in &self.bytes_to_bytes {
            bytes = codec.encode(bytes)?;
        }
        Ok(bytes)
    }

    /// Decode chunk bytes through the chain, in reverse order.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if any stage fails.
    pub fn decode(
        &self,
        mut bytes: Vec<u8>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        let representations = self.bytes_to_bytes_representations(decoded_representation)?;
        for (codec, representation) in
            std::iter::zip(&self.bytes_to_bytes, &representations).rev()
        {
            bytes = codec.decode(bytes, representation)?;
        }
        self.array_to_bytes.decode(bytes, decoded_representation)
    }

    /// Compute the encoded size of a chunk passed through the whole chain.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the array→bytes codec does not support the
    /// data type.
    pub fn compute_encoded_size(
        &self,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let mut representation = self
            .array_to_bytes
            .compute_encoded_size(decoded_representation)?;
        for codec in &self.bytes_to_bytes {
            representation = codec.compute_encoded_size(&representation);
        }
        Ok(representation)
    }

    /// The byte representation input to each bytes→bytes codec, in encode
    /// order.
    fn bytes_to_bytes_representations(
        &self,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<Vec<BytesRepresentation>, CodecError> {
        let mut representations = Vec::with_capacity(self.bytes_to_bytes.len());
        let mut representation = self
            .array_to_bytes
            .compute_encoded_size(decoded_representation)?;
        for codec in &self.bytes_to_bytes {
            representations.push(representation);
            representation = codec.compute_encoded_size(&representation);
        }
        Ok(representations)
    }
}
