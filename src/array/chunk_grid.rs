//! A regular chunk grid: uniform chunk shape, edge chunks included.

use std::num::NonZeroU64;

use derive_more::Display;
use thiserror::Error;

use crate::array_subset::{ArraySubset, IncompatibleDimensionalityError};

/// A regular chunk grid over an array.
///
/// The grid shape is the per-dimension ceiling of the array shape divided by
/// the chunk shape. Chunks on the upper boundary may extend beyond the array
/// shape; they are stored full-size with fill value padding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegularChunkGrid {
    array_shape: Vec<u64>,
    chunk_shape: Vec<NonZeroU64>,
}

/// Invalid chunk grid indices.
#[derive(Clone, Debug, Display, Error)]
#[display("chunk grid indices {_0:?} are invalid for a chunk grid of shape {_1:?}")]
pub struct InvalidChunkGridIndicesError(pub(crate) Vec<u64>, pub(crate) Vec<u64>);

impl RegularChunkGrid {
    /// Create a regular chunk grid.
    ///
    /// # Errors
    /// Returns an [`IncompatibleDimensionalityError`] if the chunk shape does
    /// not match the dimensionality of the array shape.
    pub fn new(
        array_shape: Vec<u64>,
        chunk_shape: Vec<NonZeroU64>,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if array_shape.len() == chunk_shape.len() {
            Ok(Self {
                array_shape,
                chunk_shape,
            })
        } else {
            Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                array_shape.len(),
            ))
        }
    }

    /// The dimensionality of the grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.array_shape.len()
    }

    /// The array shape.
    #[must_use]
    pub fn array_shape(&self) -> &[u64] {
        &self.array_shape
    }

    /// The chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// The chunk shape as a plain array shape.
    #[must_use]
    pub fn chunk_shape_u64(&self) -> Vec<u64> {
        self.chunk_shape.iter().map(|s| s.get()).collect()
    }

    /// The shape of the chunk grid (the number of chunks in each dimension).
    #[must_use]
    pub fn grid_shape(&self) -> Vec<u64> {
        std::iter::zip(&self.array_shape, &self.chunk_shape)
            .map(|(array, chunk)| array.div_ceil(chunk.get()))
            .collect()
    }

    /// The number of chunks in the grid.
    #[must_use]
    pub fn num_chunks(&self) -> u64 {
        self.grid_shape().iter().product()
    }

    /// Check that `chunk_indices` lie within the grid.
    ///
    /// # Errors
    /// Returns an [`InvalidChunkGridIndicesError`] if the indices have the
    /// wrong dimensionality or exceed the grid shape.
    pub fn validate_chunk_indices(
        &self,
        chunk_indices: &[u64],
    ) -> Result<(), InvalidChunkGridIndicesError> {
        let grid_shape = self.grid_shape();
        if chunk_indices.len() == grid_shape.len()
            && std::iter::zip(chunk_indices, &grid_shape).all(|(index, extent)| index < extent)
        {
            Ok(())
        } else {
            Err(InvalidChunkGridIndicesError(
                chunk_indices.to_vec(),
                grid_shape,
            ))
        }
    }

    /// The origin (first element indices) of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`InvalidChunkGridIndicesError`] if the indices are invalid.
    pub fn chunk_origin(&self, chunk_indices: &[u64]) -> Result<Vec<u64>, InvalidChunkGridIndicesError> {
        self.validate_chunk_indices(chunk_indices)?;
        Ok(std::iter::zip(chunk_indices, &self.chunk_shape)
            .map(|(index, extent)| index * extent.get())
            .collect())
    }

    /// The subset of the array covered by the chunk at `chunk_indices`,
    /// always full chunk shape (edge chunks extend beyond the array shape).
    ///
    /// # Errors
    /// Returns an [`InvalidChunkGridIndicesError`] if the indices are invalid.
    pub fn subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, InvalidChunkGridIndicesError> {
        let origin = self.chunk_origin(chunk_indices)?;
        // SAFETY: the origin dimensionality matches the chunk shape
        Ok(unsafe { ArraySubset::new_with_start_shape_unchecked(origin, self.chunk_shape_u64()) })
    }

    /// The subset of the array covered by the chunk at `chunk_indices`,
    /// clamped to the array shape.
    ///
    /// # Errors
    /// Returns an [`InvalidChunkGridIndicesError`] if the indices are invalid.
    pub fn subset_bounded(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArraySubset, InvalidChunkGridIndicesError> {
        let subset = self.subset(chunk_indices)?;
        let array_subset = ArraySubset::new_with_shape(self.array_shape.clone());
        Ok(subset
            .overlap(&array_subset)
            .map_err(|_| InvalidChunkGridIndicesError(chunk_indices.to_vec(), self.grid_shape()))?)
    }

    /// The subset of the chunk grid whose chunks intersect `array_subset`.
    ///
    /// Returns an empty subset if `array_subset` covers no chunks.
    ///
    /// # Errors
    /// Returns an [`IncompatibleDimensionalityError`] if the subset has the
    /// wrong dimensionality.
    pub fn chunks_in_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        if array_subset.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                array_subset.dimensionality(),
                self.dimensionality(),
            ));
        }
        if array_subset.is_empty() {
            return Ok(ArraySubset::new_with_shape(vec![0; self.dimensionality()]));
        }
        let mut start = Vec::with_capacity(self.dimensionality());
        let mut shape = Vec::with_capacity(self.dimensionality());
        for (range, chunk) in std::iter::zip(array_subset.to_ranges(), &self.chunk_shape) {
            let first = range.start / chunk.get();
            let last = (range.end - 1) / chunk.get();
            start.push(first);
            shape.push(last - first + 1);
        }
        // SAFETY: start and shape were built with one entry per dimension
        Ok(unsafe { ArraySubset::new_with_start_shape_unchecked(start, shape) })
    }
}
