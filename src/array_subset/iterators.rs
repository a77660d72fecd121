//! Iterators over the elements of an [`ArraySubset`].

use crate::array::ravel_indices;

use super::{ArraySubset, IncompatibleArraySubsetAndShapeError};

/// The multidimensional indices of every element in an array subset, in
/// row-major order (last dimension varying fastest).
#[derive(Clone, Debug)]
pub struct Indices {
    subset: ArraySubset,
}

impl Indices {
    /// Create a new indices struct.
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        Self { subset }
    }

    /// Return the number of indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subset.num_elements_usize()
    }

    /// Return true if there are no indices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> IndicesIterator {
        IndicesIterator::new(self.subset.clone())
    }
}

impl IntoIterator for Indices {
    type Item = Vec<u64>;
    type IntoIter = IndicesIterator;

    fn into_iter(self) -> Self::IntoIter {
        IndicesIterator::new(self.subset)
    }
}

impl<'a> IntoIterator for &'a Indices {
    type Item = Vec<u64>;
    type IntoIter = IndicesIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Serial iterator over the indices of an array subset.
///
/// Each index is computed by unravelling a linearised position, so the
/// iterator is exact-size and cheap to advance.
#[derive(Clone, Debug)]
pub struct IndicesIterator {
    subset: ArraySubset,
    index: u64,
    length: u64,
}

impl IndicesIterator {
    fn new(subset: ArraySubset) -> Self {
        let length = subset.num_elements();
        Self {
            subset,
            index: 0,
            length,
        }
    }
}

impl Iterator for IndicesIterator {
    type Item = Vec<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.length {
            return None;
        }
        let mut indices = vec![0u64; self.subset.dimensionality()];
        let mut remainder = self.index;
        for (out, (&start, &size)) in std::iter::zip(
            indices.iter_mut().rev(),
            std::iter::zip(self.subset.start(), self.subset.shape()).rev(),
        ) {
            *out = start + remainder % size;
            remainder /= size;
        }
        self.index += 1;
        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.length - self.index).unwrap();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndicesIterator {}

/// The contiguous runs of an array subset within an enclosing array,
/// linearised: each item is a (element index, run length) pair.
///
/// A run spans the innermost dimensions that the subset covers entirely, plus
/// the extent of the subset along the next (partially covered) dimension.
#[derive(Clone, Debug)]
pub struct ContiguousLinearisedIndices {
    /// The subset with the dimensions absorbed into a run collapsed to 1.
    subset_reduced: ArraySubset,
    array_shape: Vec<u64>,
    contiguous_elements: u64,
}

impl ContiguousLinearisedIndices {
    /// Create a new contiguous linearised indices struct.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `subset` is not
    /// within the bounds of `array_shape`.
    pub fn new(
        subset: &ArraySubset,
        array_shape: Vec<u64>,
    ) -> Result<Self, IncompatibleArraySubsetAndShapeError> {
        if !subset.inbounds(&array_shape) {
            return Err(IncompatibleArraySubsetAndShapeError::new(
                subset.clone(),
                array_shape,
            ));
        }
        let mut contiguous_elements = 1u64;
        let mut reduced_shape = subset.shape().to_vec();
        for i in (0..subset.dimensionality()).rev() {
            contiguous_elements *= subset.shape()[i];
            reduced_shape[i] = 1;
            let spans_dimension = subset.start()[i] == 0 && subset.shape()[i] == array_shape[i];
            if !spans_dimension {
                break;
            }
        }
        let subset_reduced = unsafe {
            // SAFETY: the start and reduced shape have the same dimensionality
            ArraySubset::new_with_start_shape_unchecked(subset.start().to_vec(), reduced_shape)
        };
        Ok(Self {
            subset_reduced,
            array_shape,
            contiguous_elements,
        })
    }

    /// Return the number of runs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subset_reduced.num_elements_usize()
    }

    /// Return true if there are no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the number of elements in each run.
    #[must_use]
    pub fn contiguous_elements(&self) -> u64 {
        self.contiguous_elements
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> ContiguousLinearisedIndicesIterator {
        ContiguousLinearisedIndicesIterator {
            inner: IndicesIterator::new(self.subset_reduced.clone()),
            array_shape: self.array_shape.clone(),
            contiguous_elements: self.contiguous_elements,
        }
    }
}

impl<'a> IntoIterator for &'a ContiguousLinearisedIndices {
    type Item = (u64, u64);
    type IntoIter = ContiguousLinearisedIndicesIterator;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Serial iterator over the contiguous runs of an array subset.
#[derive(Clone, Debug)]
pub struct ContiguousLinearisedIndicesIterator {
    inner: IndicesIterator,
    array_shape: Vec<u64>,
    contiguous_elements: u64,
}

impl Iterator for ContiguousLinearisedIndicesIterator {
    type Item = (u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|indices| (ravel_indices(&indices, &self.array_shape), self.contiguous_elements))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ContiguousLinearisedIndicesIterator {}
