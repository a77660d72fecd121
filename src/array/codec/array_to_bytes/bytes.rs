//! The `bytes` array→bytes codec: packs fixed-size elements with a
//! configured endianness.

use serde::{Deserialize, Serialize};

use crate::array::array_bytes::ArrayBytes;
use crate::array::array_representation::ArrayRepresentation;
use crate::array::bytes_representation::BytesRepresentation;
use crate::array::data_type::convert_endianness;
use crate::array::endianness::Endianness;
use crate::metadata::Metadata;

use super::super::{ArrayToBytesCodecTraits, CodecError, CodecTraits};

/// The identifier of the `bytes` codec.
pub const IDENTIFIER: &str = "bytes";

/// Configuration parameters for the `bytes` codec.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct BytesCodecConfiguration {
    /// The byte order of multi-byte elements. May be omitted for single-byte
    /// data types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endian: Option<Endianness>,
}

/// The `bytes` codec.
///
/// Encodes the flattened elements of a fixed-size data type into raw bytes
/// with the configured byte order, no header. Variable-sized data types are
/// rejected.
#[derive(Clone, Copy, Debug)]
pub struct BytesCodec {
    endian: Option<Endianness>,
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self::little()
    }
}

impl BytesCodec {
    /// Create a new `bytes` codec.
    ///
    /// `endian` may be [`None`] only for single-byte data types.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }

    /// Create a new little-endian `bytes` codec.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Some(Endianness::Little))
    }

    /// Create a new big-endian `bytes` codec.
    #[must_use]
    pub const fn big() -> Self {
        Self::new(Some(Endianness::Big))
    }

    /// Create a new `bytes` codec from a configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &BytesCodecConfiguration) -> Self {
        Self::new(configuration.endian)
    }

    /// Packing and unpacking are the same byte reordering, applied per
    /// element.
    fn encode_or_decode(
        &self,
        mut bytes: Vec<u8>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let element_size = decoded_representation.element_size().ok_or_else(|| {
            CodecError::UnsupportedDataType(decoded_representation.data_type().clone(), IDENTIFIER)
        })?;
        let expected = decoded_representation.num_elements() * element_size as u64;
        if bytes.len() as u64 != expected {
            return Err(CodecError::UnexpectedChunkDecodedSize(bytes.len(), expected));
        }
        if element_size > 1 {
            let Some(endian) = self.endian else {
                return Err(CodecError::Other(format!(
                    "the bytes codec requires an endianness for data type {}",
                    decoded_representation.data_type()
                )));
            };
            convert_endianness(&mut bytes, decoded_representation.data_type(), endian);
        }
        Ok(bytes)
    }
}

impl CodecTraits for BytesCodec {
    fn create_metadata(&self) -> Metadata {
        let configuration = BytesCodecConfiguration {
            endian: self.endian,
        };
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration)
            .expect("the bytes codec configuration is serializable")
    }
}

impl ArrayToBytesCodecTraits for BytesCodec {
    fn encode(
        &self,
        bytes: ArrayBytes<'_>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let bytes = bytes.into_fixed()?;
        self.encode_or_decode(bytes.into_owned(), decoded_representation)
    }

    fn decode(
        &self,
        bytes: Vec<u8>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        let bytes = self.encode_or_decode(bytes, decoded_representation)?;
        Ok(ArrayBytes::from(bytes))
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        decoded_representation.size().map_or_else(
            || {
                Err(CodecError::UnsupportedDataType(
                    decoded_representation.data_type().clone(),
                    IDENTIFIER,
                ))
            },
            |size| Ok(BytesRepresentation::FixedSize(size)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::data_type::DataType;
    use crate::array::fill_value::FillValue;

    fn representation_uint16(num_elements: u64) -> ArrayRepresentation {
        ArrayRepresentation::new(vec![num_elements], DataType::UInt16, FillValue::from(0u16))
            .unwrap()
    }

    #[test]
    fn codec_bytes_little() {
        let codec = BytesCodec::little();
        let representation = representation_uint16(2);
        let bytes = ArrayBytes::from(crate::array::transmute_to_bytes_vec(vec![0x0102u16, 0x0304]));
        let encoded = codec.encode(bytes.clone(), &representation).unwrap();
        assert_eq!(encoded, vec![0x02, 0x01, 0x04, 0x03]);
        let decoded = codec.decode(encoded, &representation).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn codec_bytes_big() {
        let codec = BytesCodec::big();
        let representation = representation_uint16(2);
        let bytes = ArrayBytes::from(crate::array::transmute_to_bytes_vec(vec![0x0102u16, 0x0304]));
        let encoded = codec.encode(bytes.clone(), &representation).unwrap();
        assert_eq!(encoded, vec![0x01, 0x02, 0x03, 0x04]);
        let decoded = codec.decode(encoded, &representation).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn codec_bytes_eight_byte() {
        let codec = BytesCodec::big();
        let representation =
            ArrayRepresentation::new(vec![1], DataType::UInt64, FillValue::from(0u64)).unwrap();
        let bytes = ArrayBytes::from(crate::array::transmute_to_bytes_vec(vec![
            0x0102_0304_0506_0708u64,
        ]));
        let encoded = codec.encode(bytes.clone(), &representation).unwrap();
        assert_eq!(encoded, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(codec.decode(encoded, &representation).unwrap(), bytes);
    }

    #[test]
    fn codec_bytes_float64() {
        let representation =
            ArrayRepresentation::new(vec![2], DataType::Float64, FillValue::from(0.0f64)).unwrap();
        let bytes = ArrayBytes::from(crate::array::transmute_to_bytes_vec(vec![1.5f64, -0.25]));
        for codec in [BytesCodec::little(), BytesCodec::big()] {
            let encoded = codec.encode(bytes.clone(), &representation).unwrap();
            assert_eq!(codec.decode(encoded, &representation).unwrap(), bytes);
        }
    }

    #[test]
    fn codec_bytes_bool() {
        let codec = BytesCodec::new(None);
        let representation =
            ArrayRepresentation::new(vec![3], DataType::Bool, FillValue::from(false)).unwrap();
        let bytes = ArrayBytes::from(vec![1u8, 0, 1]);
        let encoded = codec.encode(bytes.clone(), &representation).unwrap();
        assert_eq!(encoded, vec![1, 0, 1]);
        assert_eq!(codec.decode(encoded, &representation).unwrap(), bytes);
    }

    #[test]
    fn codec_bytes_char() {
        let codec = BytesCodec::big();
        let representation =
            ArrayRepresentation::new(vec![2], DataType::Char, FillValue::from(0u16)).unwrap();
        let bytes =
            ArrayBytes::from(crate::array::transmute_to_bytes_vec(vec![0x0061u16, 0x00E9]));
        let encoded = codec.encode(bytes.clone(), &representation).unwrap();
        assert_eq!(encoded, vec![0x00, 0x61, 0x00, 0xE9]);
        assert_eq!(codec.decode(encoded, &representation).unwrap(), bytes);
    }

    #[test]
    fn codec_bytes_single_byte_without_endianness() {
        let codec = BytesCodec::new(None);
        let representation =
            ArrayRepresentation::new(vec![4], DataType::UInt8, FillValue::from(0u8)).unwrap();
        let encoded = codec
            .encode(ArrayBytes::from(vec![1u8, 2, 3, 4]), &representation)
            .unwrap();
        assert_eq!(encoded, vec![1, 2, 3, 4]);
    }

    #[test]
    fn codec_bytes_multi_byte_requires_endianness() {
        let codec = BytesCodec::new(None);
        let representation = representation_uint16(2);
        assert!(codec
            .encode(ArrayBytes::from(vec![0u8; 4]), &representation)
            .is_err());
    }

    #[test]
    fn codec_bytes_invalid_size() {
        let codec = BytesCodec::little();
        let representation = representation_uint16(2);
        assert!(matches!(
            codec.decode(vec![0u8; 5], &representation),
            Err(CodecError::UnexpectedChunkDecodedSize(5, 4))
        ));
    }

    #[test]
    fn codec_bytes_rejects_strings() {
        let codec = BytesCodec::little();
        let representation =
            ArrayRepresentation::new(vec![2], DataType::String, FillValue::from("")).unwrap();
        assert!(matches!(
            codec.compute_encoded_size(&representation),
            Err(CodecError::UnsupportedDataType(DataType::String, _))
        ));
    }

    #[test]
    fn codec_bytes_configuration() {
        let configuration: BytesCodecConfiguration =
            serde_json::from_str(r#"{"endian":"big"}"#).unwrap();
        let codec = BytesCodec::new_with_configuration(&configuration);
        let metadata = codec.create_metadata();
        assert_eq!(metadata.name(), "bytes");
    }
}
