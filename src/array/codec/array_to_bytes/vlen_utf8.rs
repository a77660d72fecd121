//! The `vlen-utf8` array→bytes codec: variable-length UTF-8 string packing.
//!
//! Wire format: a `(n+1)`-entry little-endian `i32` offset table (absolute
//! byte offsets into the payload, `offset[0] = 0`) immediately followed by
//! the concatenated UTF-8 payload of all `n` strings.

use crate::array::array_bytes::ArrayBytes;
use crate::array::array_representation::ArrayRepresentation;
use crate::array::bytes_representation::BytesRepresentation;
use crate::array::data_type::DataType;
use crate::metadata::Metadata;

use super::super::{ArrayToBytesCodecTraits, CodecError, CodecTraits};

/// The identifier of the `vlen-utf8` codec.
pub const IDENTIFIER: &str = "vlen-utf8";

/// The `vlen-utf8` codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct VlenUtf8Codec;

impl VlenUtf8Codec {
    /// Create a new `vlen-utf8` codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CodecTraits for VlenUtf8Codec {
    fn create_metadata(&self) -> Metadata {
        Metadata::new(IDENTIFIER)
    }
}

impl ArrayToBytesCodecTraits for VlenUtf8Codec {
    fn encode(
        &self,
        bytes: ArrayBytes<'_>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        if *decoded_representation.data_type() != DataType::String {
            return Err(CodecError::UnsupportedDataType(
                decoded_representation.data_type().clone(),
                IDENTIFIER,
            ));
        }
        let (payload, offsets) = bytes.into_variable()?;
        if offsets.len() as u64 != decoded_representation.num_elements() + 1 {
            return Err(CodecError::InvalidVariableSizedArrayOffsets);
        }
        let mut encoded = Vec::with_capacity(4 * offsets.len() + payload.len());
        for &offset in offsets.iter() {
            let offset = i32::try_from(offset)
                .map_err(|_| CodecError::from("string array payload exceeds 2 GiB"))?;
            encoded.extend_from_slice(&offset.to_le_bytes());
        }
        encoded.extend_from_slice(&payload);
        Ok(encoded)
    }

    fn decode(
        &self,
        bytes: Vec<u8>,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        if *decoded_representation.data_type() != DataType::String {
            return Err(CodecError::UnsupportedDataType(
                decoded_representation.data_type().clone(),
                IDENTIFIER,
            ));
        }
        let num_elements = decoded_representation.num_elements_usize();
        let table_size = 4 * (num_elements + 1);
        if bytes.len() < table_size {
            return Err(CodecError::InvalidVariableSizedArrayOffsets);
        }
        let (table, payload) = bytes.split_at(table_size);
        let mut offsets = Vec::with_capacity(num_elements + 1);
        for entry in table.chunks_exact(4) {
            let offset = i32::from_le_bytes(entry.try_into().expect("4 byte chunks"));
            let offset =
                usize::try_from(offset).map_err(|_| CodecError::InvalidVariableSizedArrayOffsets)?;
            if offset > payload.len() || offsets.last().is_some_and(|&last| offset < last) {
                return Err(CodecError::InvalidVariableSizedArrayOffsets);
            }
            offsets.push(offset);
        }
        if offsets[0] != 0 {
            return Err(CodecError::InvalidVariableSizedArrayOffsets);
        }
        let payload = &payload[..offsets[num_elements]];
        // each element must be valid UTF-8 on its own, offsets that split a
        // multi-byte sequence between elements are rejected
        for window in offsets.windows(2) {
            core::str::from_utf8(&payload[window[0]..window[1]])?;
        }
        Ok(ArrayBytes::new_vlen(payload.to_vec(), offsets))
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ArrayRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        if *decoded_representation.data_type() == DataType::String {
            Ok(BytesRepresentation::UnboundedSize)
        } else {
            Err(CodecError::UnsupportedDataType(
                decoded_representation.data_type().clone(),
                IDENTIFIER,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::fill_value::FillValue;

    fn representation(num_elements: u64) -> ArrayRepresentation {
        ArrayRepresentation::new(vec![num_elements], DataType::String, FillValue::from(""))
            .unwrap()
    }

    #[test]
    fn codec_vlen_utf8_wire_format() {
        // ["ab", "", "xyz"] packs to the offset table [0, 2, 2, 5] and the
        // payload "abxyz"
        let codec = VlenUtf8Codec::new();
        let encoded = codec
            .encode(ArrayBytes::from(["ab", "", "xyz"].as_slice()), &representation(3))
            .unwrap();
        #[rustfmt::skip]
        assert_eq!(
            encoded,
            vec![
                0, 0, 0, 0,
                2, 0, 0, 0,
                2, 0, 0, 0,
                5, 0, 0, 0,
                b'a', b'b', b'x', b'y', b'z',
            ]
        );
        let decoded = codec.decode(encoded, &representation(3)).unwrap();
        assert_eq!(decoded, ArrayBytes::from(["ab", "", "xyz"].as_slice()));
    }

    #[test]
    fn codec_vlen_utf8_empty_and_single() {
        let codec = VlenUtf8Codec::new();
        for elements in [vec![], vec!["solo"]] {
            let representation = representation(elements.len() as u64);
            let bytes = ArrayBytes::from(elements.as_slice());
            let encoded = codec.encode(bytes.clone(), &representation).unwrap();
            assert_eq!(codec.decode(encoded, &representation).unwrap(), bytes);
        }
    }

    #[test]
    fn codec_vlen_utf8_truncated_table() {
        let codec = VlenUtf8Codec::new();
        assert!(matches!(
            codec.decode(vec![0u8; 7], &representation(3)),
            Err(CodecError::InvalidVariableSizedArrayOffsets)
        ));
    }

    #[test]
    fn codec_vlen_utf8_non_monotonic_offsets() {
        let codec = VlenUtf8Codec::new();
        let mut encoded = Vec::new();
        for offset in [0i32, 3, 1] {
            encoded.extend_from_slice(&offset.to_le_bytes());
        }
        encoded.extend_from_slice(b"abc");
        assert!(matches!(
            codec.decode(encoded, &representation(2)),
            Err(CodecError::InvalidVariableSizedArrayOffsets)
        ));
    }

    #[test]
    fn codec_vlen_utf8_offset_out_of_bounds() {
        let codec = VlenUtf8Codec::new();
        let mut encoded = Vec::new();
        for offset in [0i32, 10] {
            encoded.extend_from_slice(&offset.to_le_bytes());
        }
        encoded.extend_from_slice(b"ab");
        assert!(matches!(
            codec.decode(encoded, &representation(1)),
            Err(CodecError::InvalidVariableSizedArrayOffsets)
        ));
    }

    #[test]
    fn codec_vlen_utf8_offset_splits_multi_byte_sequence() {
        // "aéb" is valid UTF-8 as a whole, but the offsets cut through the
        // two-byte "é"
        let codec = VlenUtf8Codec::new();
        let mut encoded = Vec::new();
        for offset in [0i32, 2, 4] {
            encoded.extend_from_slice(&offset.to_le_bytes());
        }
        encoded.extend_from_slice("aéb".as_bytes());
        assert!(matches!(
            codec.decode(encoded, &representation(2)),
            Err(CodecError::InvalidUtf8(_))
        ));
    }

    #[test]
    fn codec_vlen_utf8_invalid_utf8() {
        let codec = VlenUtf8Codec::new();
        let mut encoded = Vec::new();
        for offset in [0i32, 2] {
            encoded.extend_from_slice(&offset.to_le_bytes());
        }
        encoded.extend_from_slice(&[0xff, 0xfe]);
        assert!(matches!(
            codec.decode(encoded, &representation(1)),
            Err(CodecError::InvalidUtf8(_))
        ));
    }
}
