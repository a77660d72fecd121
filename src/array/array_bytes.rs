//! In-memory chunk/array element storage.
//!
//! [`ArrayBytes`] holds the flattened elements of an array region either as
//! plain fixed-size elements or as a variable-length payload with an offset
//! per element, which is how string arrays travel between the engines and
//! the codecs.

use std::borrow::Cow;

use itertools::izip;

use crate::array_subset::ArraySubset;

use super::codec::CodecError;
use super::data_type::{DataType, DataTypeSize};
use super::fill_value::FillValue;
use super::ravel_indices;

/// Array element bytes.
pub type RawBytes<'a> = Cow<'a, [u8]>;

/// Per-element byte offsets into [`RawBytes`].
///
/// Always monotonically increasing, one longer than the element count, with
/// a leading `0` and a final value equal to the payload length.
pub type RawBytesOffsets<'a> = Cow<'a, [usize]>;

/// The flattened elements of an array region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayBytes<'a> {
    /// Bytes for a fixed-size data type, one element after another in
    /// row-major order.
    Fixed(RawBytes<'a>),
    /// Bytes for the variable-sized string data type: a concatenated payload
    /// and the offset of each element within it.
    Variable(RawBytes<'a>, RawBytesOffsets<'a>),
}

impl<'a> ArrayBytes<'a> {
    /// Create a new fixed-length array bytes from `bytes`.
    pub fn new_flen(bytes: impl Into<RawBytes<'a>>) -> Self {
        Self::Fixed(bytes.into())
    }

    /// Create a new variable-length array bytes from `bytes` and `offsets`.
    ///
    /// # Panics (debug)
    /// The offsets must be monotonically increasing, start at zero, and end
    /// at the length of `bytes`.
    pub fn new_vlen(
        bytes: impl Into<RawBytes<'a>>,
        offsets: impl Into<RawBytesOffsets<'a>>,
    ) -> Self {
        let bytes = bytes.into();
        let offsets = offsets.into();
        debug_assert!(offsets_are_valid(&offsets, bytes.len()));
        Self::Variable(bytes, offsets)
    }

    /// Create array bytes of `num_elements` elements equal to `fill_value`.
    #[must_use]
    pub fn new_fill_value(
        num_elements: u64,
        data_type: &DataType,
        fill_value: &FillValue,
    ) -> ArrayBytes<'static> {
        let num_elements = usize::try_from(num_elements).unwrap();
        match data_type.size() {
            DataTypeSize::Fixed(_) => {
                ArrayBytes::Fixed(Cow::Owned(fill_value.as_ne_bytes().repeat(num_elements)))
            }
            DataTypeSize::Variable => {
                let fill_size = fill_value.size();
                let offsets: Vec<usize> = (0..=num_elements).map(|i| i * fill_size).collect();
                ArrayBytes::new_vlen(fill_value.as_ne_bytes().repeat(num_elements), offsets)
            }
        }
    }

    /// Return the total length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Fixed(bytes) | Self::Variable(bytes, _) => bytes.len(),
        }
    }

    /// Return true if there are no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert into owned array bytes with a `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> ArrayBytes<'static> {
        match self {
            Self::Fixed(bytes) => ArrayBytes::Fixed(Cow::Owned(bytes.into_owned())),
            Self::Variable(bytes, offsets) => ArrayBytes::Variable(
                Cow::Owned(bytes.into_owned()),
                Cow::Owned(offsets.into_owned()),
            ),
        }
    }

    /// Convert into the bytes of a fixed-size data type.
    ///
    /// # Errors
    /// Returns [`CodecError::ExpectedFixedLengthBytes`] for variable-length
    /// array bytes.
    pub fn into_fixed(self) -> Result<RawBytes<'a>, CodecError> {
        match self {
            Self::Fixed(bytes) => Ok(bytes),
            Self::Variable(..) => Err(CodecError::ExpectedFixedLengthBytes),
        }
    }

    /// Convert into a variable-length payload and offsets.
    ///
    /// # Errors
    /// Returns [`CodecError::ExpectedVariableLengthBytes`] for fixed-length
    /// array bytes.
    pub fn into_variable(self) -> Result<(RawBytes<'a>, RawBytesOffsets<'a>), CodecError> {
        match self {
            Self::Variable(bytes, offsets) => Ok((bytes, offsets)),
            Self::Fixed(..) => Err(CodecError::ExpectedVariableLengthBytes),
        }
    }

    /// Validate the array bytes against an element count and data type size.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the byte length (fixed) or the offsets
    /// (variable) do not describe exactly `num_elements` elements.
    pub fn validate(
        &self,
        num_elements: u64,
        data_type_size: DataTypeSize,
    ) -> Result<(), CodecError> {
        match (self, data_type_size) {
            (Self::Fixed(bytes), DataTypeSize::Fixed(element_size)) => {
                let expected = num_elements * element_size as u64;
                if bytes.len() as u64 == expected {
                    Ok(())
                } else {
                    Err(CodecError::UnexpectedChunkDecodedSize(bytes.len(), expected))
                }
            }
            (Self::Variable(bytes, offsets), DataTypeSize::Variable) => {
                if offsets.len() as u64 == num_elements + 1
                    && offsets_are_valid(offsets, bytes.len())
                {
                    Ok(())
                } else {
                    Err(CodecError::InvalidVariableSizedArrayOffsets)
                }
            }
            (Self::Fixed(_), DataTypeSize::Variable) => {
                Err(CodecError::ExpectedVariableLengthBytes)
            }
            (Self::Variable(..), DataTypeSize::Fixed(_)) => {
                Err(CodecError::ExpectedFixedLengthBytes)
            }
        }
    }

    /// Return true if every element equals `fill_value`.
    #[must_use]
    pub fn is_fill_value(&self, fill_value: &FillValue) -> bool {
        match self {
            Self::Fixed(bytes) => fill_value.equals_all(bytes),
            Self::Variable(bytes, offsets) => offsets
                .windows(2)
                .all(|window| &bytes[window[0]..window[1]] == fill_value.as_ne_bytes()),
        }
    }

    /// Extract the elements of `subset` from the flattened elements of an
    /// array with `array_shape`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if `subset` is out of bounds of
    /// `array_shape` or the array bytes do not match `array_shape`.
    pub fn extract_array_subset(
        &self,
        subset: &ArraySubset,
        array_shape: &[u64],
        data_type: &DataType,
    ) -> Result<ArrayBytes<'static>, CodecError> {
        match self {
            Self::Fixed(bytes) => {
                let element_size = data_type
                    .fixed_size()
                    .ok_or(CodecError::ExpectedVariableLengthBytes)?;
                let bytes = subset.extract_bytes(bytes, array_shape, element_size)?;
                Ok(ArrayBytes::Fixed(Cow::Owned(bytes)))
            }
            Self::Variable(bytes, offsets) => {
                let mut subset_bytes: Vec<u8> = Vec::new();
                let mut subset_offsets: Vec<usize> =
                    Vec::with_capacity(subset.num_elements_usize() + 1);
                subset_offsets.push(0);
                for indices in &subset.indices() {
                    let element = usize::try_from(ravel_indices(&indices, array_shape)).unwrap();
                    if element + 1 >= offsets.len() {
                        return Err(CodecError::InvalidVariableSizedArrayOffsets);
                    }
                    subset_bytes.extend_from_slice(&bytes[offsets[element]..offsets[element + 1]]);
                    subset_offsets.push(subset_bytes.len());
                }
                Ok(ArrayBytes::Variable(
                    Cow::Owned(subset_bytes),
                    Cow::Owned(subset_offsets),
                ))
            }
        }
    }
}

impl From<&[&str]> for ArrayBytes<'static> {
    fn from(elements: &[&str]) -> Self {
        let mut bytes: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = Vec::with_capacity(elements.len() + 1);
        offsets.push(0);
        for element in elements {
            bytes.extend_from_slice(element.as_bytes());
            offsets.push(bytes.len());
        }
        Self::Variable(Cow::Owned(bytes), Cow::Owned(offsets))
    }
}

impl From<&[String]> for ArrayBytes<'static> {
    fn from(elements: &[String]) -> Self {
        let elements: Vec<&str> = elements.iter().map(String::as_str).collect();
        Self::from(elements.as_slice())
    }
}

impl<'a> From<&'a [u8]> for ArrayBytes<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Fixed(Cow::Borrowed(bytes))
    }
}

impl From<Vec<u8>> for ArrayBytes<'static> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Fixed(Cow::Owned(bytes))
    }
}

fn offsets_are_valid(offsets: &[usize], bytes_len: usize) -> bool {
    !offsets.is_empty()
        && offsets[0] == 0
        && *offsets.last().unwrap() == bytes_len
        && offsets.windows(2).all(|window| window[0] <= window[1])
}

/// Copy the elements of `subset_bytes` into the positions of `subset` within
/// the flattened `output` of an array with `output_shape`, whose elements
/// are `element_size` bytes.
///
/// Writes touch only the byte ranges of `output` covered by `subset`:
/// concurrent callers writing disjoint subsets of the same buffer (such as
/// the read engine's per-chunk tasks) never overlap.
///
/// # Panics
/// Panics if `subset` is out of bounds of `output_shape` or the byte lengths
/// are inconsistent with `subset` and `element_size`.
pub fn update_bytes_flen(
    output: &mut [u8],
    output_shape: &[u64],
    subset_bytes: &[u8],
    subset: &ArraySubset,
    element_size: usize,
) {
    debug_assert_eq!(
        output.len() as u64,
        output_shape.iter().product::<u64>() * element_size as u64
    );
    debug_assert_eq!(
        subset_bytes.len() as u64,
        subset.num_elements() * element_size as u64
    );
    let contiguous_indices = subset
        .contiguous_linearised_indices(output_shape)
        .expect("subset is within the output shape");
    let length = usize::try_from(contiguous_indices.contiguous_elements()).unwrap() * element_size;
    let mut offset = 0;
    for (index, _) in &contiguous_indices {
        let output_offset = usize::try_from(index).unwrap() * element_size;
        output[output_offset..output_offset + length]
            .copy_from_slice(&subset_bytes[offset..offset + length]);
        offset += length;
    }
}

/// Merge the `chunk_subset` block of a chunk into the start-aligned position
/// of a chunk-shaped output buffer, used to pad edge chunks: positions
/// outside `chunk_subset` keep their current (fill) value.
pub(crate) fn pad_fixed_chunk(
    block: &[u8],
    block_subset: &ArraySubset,
    chunk_shape: &[u64],
    fill_value: &FillValue,
    element_size: usize,
) -> Vec<u8> {
    let num_elements = usize::try_from(chunk_shape.iter().product::<u64>()).unwrap();
    let mut chunk_bytes = fill_value.as_ne_bytes().repeat(num_elements);
    update_bytes_flen(&mut chunk_bytes, chunk_shape, block, block_subset, element_size);
    chunk_bytes
}

/// Pad the variable-length elements of a partial (edge) chunk block to the
/// full chunk shape, filling the tail positions with `fill_value`.
pub(crate) fn pad_variable_chunk(
    block_bytes: &[u8],
    block_offsets: &[usize],
    block_shape: &[u64],
    chunk_shape: &[u64],
    fill_value: &FillValue,
) -> (Vec<u8>, Vec<usize>) {
    let num_elements = usize::try_from(chunk_shape.iter().product::<u64>()).unwrap();
    let mut bytes: Vec<u8> = Vec::with_capacity(block_bytes.len());
    let mut offsets: Vec<usize> = Vec::with_capacity(num_elements + 1);
    offsets.push(0);
    // Chunk positions and block elements are both in row-major order, so the
    // in-bounds positions consume block elements sequentially.
    let mut block_element = 0;
    for indices in &ArraySubset::new_with_shape(chunk_shape.to_vec()).indices() {
        let in_block = izip!(&indices, block_shape).all(|(index, size)| index < size);
        if in_block {
            let start = block_offsets[block_element];
            let end = block_offsets[block_element + 1];
            bytes.extend_from_slice(&block_bytes[start..end]);
            block_element += 1;
        } else {
            bytes.extend_from_slice(fill_value.as_ne_bytes());
        }
        offsets.push(bytes.len());
    }
    (bytes, offsets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_bytes_vlen_from_strings() {
        let bytes = ArrayBytes::from(["ab", "", "xyz"].as_slice());
        let ArrayBytes::Variable(payload, offsets) = &bytes else {
            panic!("expected variable-length bytes");
        };
        assert_eq!(payload.as_ref(), b"abxyz");
        assert_eq!(offsets.as_ref(), &[0, 2, 2, 5]);
        assert!(bytes.validate(3, DataTypeSize::Variable).is_ok());
        assert!(bytes.validate(4, DataTypeSize::Variable).is_err());
    }

    #[test]
    fn array_bytes_validate_fixed() {
        let bytes = ArrayBytes::new_flen(vec![0u8; 16]);
        assert!(bytes.validate(4, DataTypeSize::Fixed(4)).is_ok());
        assert!(bytes.validate(5, DataTypeSize::Fixed(4)).is_err());
        assert!(bytes.validate(4, DataTypeSize::Variable).is_err());
    }

    #[test]
    fn array_bytes_fill_value() {
        let bytes = ArrayBytes::new_fill_value(3, &DataType::Int32, &FillValue::from(7i32));
        assert!(bytes.is_fill_value(&FillValue::from(7i32)));
        assert!(!bytes.is_fill_value(&FillValue::from(8i32)));

        let bytes = ArrayBytes::new_fill_value(3, &DataType::String, &FillValue::from("na"));
        assert_eq!(bytes, ArrayBytes::from(["na", "na", "na"].as_slice()));
        assert!(bytes.is_fill_value(&FillValue::from("na")));
    }

    #[test]
    fn array_bytes_extract_variable() {
        let bytes = ArrayBytes::from(["a", "bc", "def", "ghij"].as_slice());
        let extracted = bytes
            .extract_array_subset(
                &ArraySubset::new_with_ranges(&[0..2, 1..2]),
                &[2, 2],
                &DataType::String,
            )
            .unwrap();
        assert_eq!(extracted, ArrayBytes::from(["bc", "ghij"].as_slice()));
    }

    #[test]
    fn update_bytes_flen_scatter() {
        let mut output = vec![0u8; 16];
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        update_bytes_flen(&mut output, &[4, 4], &[1, 2, 3, 4], &subset, 1);
        assert_eq!(
            output,
            &[0, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn pad_variable_chunk_tail() {
        // 3 of 4 positions of a [4] chunk in bounds
        let block = ArrayBytes::from(["ab", "", "xyz"].as_slice());
        let ArrayBytes::Variable(bytes, offsets) = block else {
            unreachable!()
        };
        let (padded_bytes, padded_offsets) =
            pad_variable_chunk(&bytes, &offsets, &[3], &[4], &FillValue::from("?"));
        assert_eq!(padded_bytes, b"abxyz?");
        assert_eq!(padded_offsets, &[0, 2, 2, 5, 6]);
    }
}
