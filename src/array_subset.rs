//! Rectangular subsets of multidimensional arrays.
//!
//! An [`ArraySubset`] is a per-dimension `start` and `shape` in element
//! coordinates. Subsets describe read/write windows and the intersection of a
//! chunk with such a window. The iterators in [`iterators`] enumerate the
//! element indices of a subset and its contiguous runs within an enclosing
//! array, which is what the engines build their bulk copies from.

mod iterators;

pub use iterators::{
    ContiguousLinearisedIndices, ContiguousLinearisedIndicesIterator, Indices, IndicesIterator,
};

use std::ops::Range;

use itertools::izip;
use thiserror::Error;

/// A rectangular subset of an array: a `start` element index and a `shape`
/// per dimension.
#[derive(Clone, Eq, PartialEq, Default)]
pub struct ArraySubset {
    /// The start of the array subset.
    start: Vec<u64>,
    /// The shape of the array subset.
    shape: Vec<u64>,
}

impl ArraySubset {
    /// Create a new array subset at the origin with `shape`.
    #[must_use]
    pub fn new_with_shape(shape: Vec<u64>) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset with `start` and `shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and
    /// `shape` do not match.
    pub fn new_with_start_shape(
        start: Vec<u64>,
        shape: Vec<u64>,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                start.len(),
                shape.len(),
            ))
        }
    }

    /// Create a new array subset with `start` and `shape` without checking
    /// their dimensionality.
    ///
    /// # Safety
    /// The size of `start` and `shape` must match.
    #[must_use]
    pub unsafe fn new_with_start_shape_unchecked(start: Vec<u64>, shape: Vec<u64>) -> Self {
        debug_assert_eq!(start.len(), shape.len());
        Self { start, shape }
    }

    /// Create a new array subset from per-dimension `ranges`.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges
            .iter()
            .map(|range| range.end.saturating_sub(range.start))
            .collect();
        Self { start, shape }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the exclusive end of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> Vec<u64> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Return the array subset as per-dimension ranges.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start + size)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a [`usize`].
    ///
    /// # Panics
    /// Panics if [`num_elements()`](Self::num_elements) is greater than
    /// [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Return true if the array subset contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_elements() == 0
    }

    /// Return true if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && izip!(&self.start, &self.shape, array_shape)
                .all(|(&start, &size, &bound)| start + size <= bound)
    }

    /// Bound the array subset to the domain of an array with `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of
    /// `array_shape` does not match.
    pub fn bound(&self, array_shape: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if array_shape.len() == self.dimensionality() {
            let start: Vec<u64> = std::iter::zip(&self.start, array_shape)
                .map(|(&start, &bound)| start.min(bound))
                .collect();
            let shape = izip!(&start, self.end_exc(), array_shape)
                .map(|(&start, end, &bound)| end.min(bound).saturating_sub(start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                array_shape.len(),
                self.dimensionality(),
            ))
        }
    }

    /// Return the intersection of this array subset with `other`.
    ///
    /// The result is in the same (absolute) coordinate space as the inputs.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of
    /// `other` does not match.
    pub fn overlap(&self, other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        if other.dimensionality() == self.dimensionality() {
            let start: Vec<u64> = std::iter::zip(&self.start, &other.start)
                .map(|(a, b)| *a.max(b))
                .collect();
            let shape = izip!(&start, self.end_exc(), other.end_exc())
                .map(|(&start, end_a, end_b)| end_a.min(end_b).saturating_sub(start))
                .collect();
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                other.dimensionality(),
                self.dimensionality(),
            ))
        }
    }

    /// Translate the array subset into the coordinate space of a region
    /// beginning at `start`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of
    /// `start` does not match.
    pub fn relative_to(&self, start: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == self.dimensionality() {
            Ok(Self {
                start: std::iter::zip(&self.start, start)
                    .map(|(a, b)| a.saturating_sub(*b))
                    .collect(),
                shape: self.shape.clone(),
            })
        } else {
            Err(IncompatibleDimensionalityError::new(
                start.len(),
                self.dimensionality(),
            ))
        }
    }

    /// Return the indices of every element of the array subset, in row-major
    /// order (last dimension varying fastest).
    #[must_use]
    pub fn indices(&self) -> Indices {
        Indices::new(self.clone())
    }

    /// Return the contiguous runs of the array subset within an array of
    /// shape `array_shape`, as (linearised element index, run length) pairs.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if the subset is not
    /// within the bounds of `array_shape`.
    pub fn contiguous_linearised_indices(
        &self,
        array_shape: &[u64],
    ) -> Result<ContiguousLinearisedIndices, IncompatibleArraySubsetAndShapeError> {
        ContiguousLinearisedIndices::new(self, array_shape.to_vec())
    }

    /// Extract the bytes covered by this array subset from the flattened
    /// `bytes` of an array with `array_shape` and fixed-size elements of
    /// `element_size` bytes.
    ///
    /// The output is in row-major order with a length of
    /// [`num_elements()`](Self::num_elements) × `element_size`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if the subset is out
    /// of bounds of `array_shape` or `bytes` does not match `array_shape`.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<u8>, IncompatibleArraySubsetAndShapeError> {
        let array_num_elements = usize::try_from(array_shape.iter().product::<u64>()).unwrap();
        if bytes.len() != array_num_elements * element_size {
            return Err(IncompatibleArraySubsetAndShapeError(
                self.clone(),
                array_shape.to_vec(),
            ));
        }
        let contiguous_indices = self.contiguous_linearised_indices(array_shape)?;
        let mut bytes_subset = Vec::with_capacity(self.num_elements_usize() * element_size);
        for (array_index, contiguous_elements) in &contiguous_indices {
            let byte_index = usize::try_from(array_index).unwrap() * element_size;
            let byte_length = usize::try_from(contiguous_elements).unwrap() * element_size;
            bytes_subset.extend_from_slice(&bytes[byte_index..byte_index + byte_length]);
        }
        Ok(bytes_subset)
    }
}

impl std::fmt::Display for ArraySubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_ranges())
    }
}

impl std::fmt::Debug for ArraySubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.to_ranges())
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An array subset is incompatible with an array shape.
#[derive(Clone, Debug, Error)]
#[error("array subset {0} is incompatible with array of shape {1:?}")]
pub struct IncompatibleArraySubsetAndShapeError(ArraySubset, Vec<u64>);

impl IncompatibleArraySubsetAndShapeError {
    /// Create a new incompatible array subset and shape error.
    #[must_use]
    pub fn new(subset: ArraySubset, array_shape: Vec<u64>) -> Self {
        Self(subset, array_shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset_ranges() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 2..6]);
        assert_eq!(subset.start(), &[1, 2]);
        assert_eq!(subset.shape(), &[2, 4]);
        assert_eq!(subset.end_exc(), &[3, 6]);
        assert_eq!(subset.num_elements(), 8);
        assert!(!subset.is_empty());
        assert!(subset.inbounds(&[3, 6]));
        assert!(!subset.inbounds(&[3, 5]));
        assert_eq!(subset.to_string(), "[1..3, 2..6]");
    }

    #[test]
    fn array_subset_dimensionality() {
        assert!(ArraySubset::new_with_start_shape(vec![0], vec![2, 2]).is_err());
        assert!(ArraySubset::new_with_start_shape(vec![0, 0], vec![2, 2]).is_ok());
    }

    #[test]
    fn array_subset_bound() {
        let subset = ArraySubset::new_with_ranges(&[2..6, 0..4]);
        let bounded = subset.bound(&[5, 10]).unwrap();
        assert_eq!(bounded, ArraySubset::new_with_ranges(&[2..5, 0..4]));
        assert!(subset.bound(&[5]).is_err());
    }

    #[test]
    fn array_subset_overlap() {
        let subset = ArraySubset::new_with_ranges(&[0..4, 2..8]);
        let other = ArraySubset::new_with_ranges(&[2..6, 0..4]);
        let overlap = subset.overlap(&other).unwrap();
        assert_eq!(overlap, ArraySubset::new_with_ranges(&[2..4, 2..4]));
        let relative = overlap.relative_to(other.start()).unwrap();
        assert_eq!(relative, ArraySubset::new_with_ranges(&[0..2, 2..4]));
    }

    #[test]
    fn array_subset_disjoint_overlap_is_empty() {
        let subset = ArraySubset::new_with_ranges(&[0..2]);
        let other = ArraySubset::new_with_ranges(&[4..6]);
        assert!(subset.overlap(&other).unwrap().is_empty());
    }

    #[test]
    fn array_subset_extract_bytes() {
        // 2x4 array of u8, extract the central 2x2 block
        let bytes: Vec<u8> = (0..8).collect();
        let subset = ArraySubset::new_with_ranges(&[0..2, 1..3]);
        let extracted = subset.extract_bytes(&bytes, &[2, 4], 1).unwrap();
        assert_eq!(extracted, &[1, 2, 5, 6]);
        assert!(subset.extract_bytes(&bytes, &[2, 3], 1).is_err());
    }
}
