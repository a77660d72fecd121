use derive_more::Display;

use super::data_type::{DataType, DataTypeSize, IncompatibleFillValueError};
use super::fill_value::FillValue;

/// The shape, data type, and fill value of an array or chunk: the "typed
/// array" side of the contract between codec pipeline stages.
#[derive(Clone, Debug, Display)]
#[display("{shape:?} {data_type} {fill_value}")]
pub struct ArrayRepresentation {
    /// The shape of the array.
    shape: Vec<u64>,
    /// The data type of the array.
    data_type: DataType,
    /// The fill value of the array.
    fill_value: FillValue,
}

impl ArrayRepresentation {
    /// Create a new array representation.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the size of `fill_value`
    /// does not match the size of an element of `data_type`.
    pub fn new(
        shape: Vec<u64>,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<Self, IncompatibleFillValueError> {
        match data_type.size() {
            DataTypeSize::Fixed(size) if size != fill_value.size() => Err(
                IncompatibleFillValueError::new(data_type.identifier(), fill_value),
            ),
            _ => Ok(Self {
                shape,
                data_type,
                fill_value,
            }),
        }
    }

    /// Return the shape of the array.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Return the data type of the array.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Return the fill value of the array.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Return the number of elements in the array.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements in the array as a [`usize`].
    ///
    /// # Panics
    /// Panics if [`num_elements()`](Self::num_elements) is greater than
    /// [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Return the fixed size of an element in bytes, or [`None`] for
    /// variable-sized data types.
    #[must_use]
    pub const fn element_size(&self) -> Option<usize> {
        self.data_type.fixed_size()
    }

    /// Return the total size of the array in bytes, or [`None`] for
    /// variable-sized data types.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.element_size()
            .map(|element_size| self.num_elements() * element_size as u64)
    }

    /// Return the total size of the array in bytes as a [`usize`], or
    /// [`None`] for variable-sized data types.
    #[must_use]
    pub fn size_usize(&self) -> Option<usize> {
        self.element_size()
            .map(|element_size| self.num_elements_usize() * element_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_representation_fixed() {
        let representation = ArrayRepresentation::new(
            vec![2, 3],
            DataType::Float32,
            FillValue::from(0.0f32),
        )
        .unwrap();
        assert_eq!(representation.num_elements(), 6);
        assert_eq!(representation.element_size(), Some(4));
        assert_eq!(representation.size(), Some(24));
    }

    #[test]
    fn array_representation_incompatible_fill_value() {
        assert!(
            ArrayRepresentation::new(vec![2, 3], DataType::Float32, FillValue::from(0.0f64))
                .is_err()
        );
    }

    #[test]
    fn array_representation_variable() {
        let representation =
            ArrayRepresentation::new(vec![4], DataType::String, FillValue::from("")).unwrap();
        assert_eq!(representation.size(), None);
        assert_eq!(representation.num_elements(), 4);
    }
}
