use rayon::prelude::*;

use crate::storage::{meta_key, WritableStorageTraits};

use super::array_bytes::{pad_fixed_chunk, pad_variable_chunk, ArrayBytes};
use super::{transmute_to_bytes_vec, Array, ArrayError, DataTypeSize};

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Encode the array metadata and store it at the `zarr.json` key below
    /// the array path.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] on an underlying store error.
    pub fn store_metadata(&self) -> Result<(), ArrayError> {
        let key = meta_key(self.path());
        let metadata = serde_json::to_vec_pretty(&self.metadata())
            .map_err(|err| crate::storage::StorageError::InvalidMetadata(key.clone(), err.to_string()))?;
        Ok(self.storage.set(&key, metadata)?)
    }

    /// Encode `chunk_bytes` and store the chunk at `chunk_indices`.
    ///
    /// A chunk composed entirely of the fill value is erased from the store
    /// instead of stored.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - the length of `chunk_bytes` does not match the chunk,
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: ArrayBytes<'_>,
    ) -> Result<(), ArrayError> {
        let chunk_representation = self.chunk_array_representation(chunk_indices)?;
        chunk_bytes.validate(chunk_representation.num_elements(), self.data_type().size())?;
        if chunk_bytes.is_fill_value(self.fill_value()) {
            self.erase_chunk(chunk_indices)
        } else {
            let encoded = self.codecs().encode(chunk_bytes, &chunk_representation)?;
            Ok(self.storage.set(&self.chunk_key(chunk_indices), encoded)?)
        }
    }

    /// Encode `elements` and store the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or any error of [`store_chunk`](Array::store_chunk).
    pub fn store_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        if self.data_type().fixed_size() != Some(core::mem::size_of::<T>()) {
            return Err(ArrayError::IncompatibleElementSize(
                core::mem::size_of::<T>(),
                self.data_type().fixed_size(),
            ));
        }
        self.store_chunk(chunk_indices, ArrayBytes::from(transmute_to_bytes_vec(elements)))
    }

    /// Encode `array_bytes` covering the whole array and store every chunk.
    ///
    /// Every chunk of the grid is rewritten, in parallel. Edge chunks are
    /// padded to the full chunk shape with the fill value before encoding,
    /// and chunks composed entirely of the fill value are erased. This is
    /// a full-array rewrite and it is not atomic: a reader concurrent with
    /// it can observe a mix of old and new chunks.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the length of `array_bytes` does not match the array,
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_array(&self, array_bytes: ArrayBytes<'_>) -> Result<(), ArrayError> {
        let num_elements = self.shape().iter().product::<u64>();
        array_bytes.validate(num_elements, self.data_type().size())?;

        let grid_shape = self.chunk_grid().grid_shape();
        let chunks = crate::array_subset::ArraySubset::new_with_shape(grid_shape);
        let chunk_indices: Vec<Vec<u64>> = chunks.indices().into_iter().collect();
        chunk_indices.into_par_iter().try_for_each(|chunk_indices| {
            self.store_array_chunk(&chunk_indices, &array_bytes)
        })
    }

    /// Encode `elements` covering the whole array and store every chunk.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or any error of [`store_array`](Array::store_array).
    pub fn store_array_elements<T: bytemuck::Pod>(
        &self,
        elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        if self.data_type().fixed_size() != Some(core::mem::size_of::<T>()) {
            return Err(ArrayError::IncompatibleElementSize(
                core::mem::size_of::<T>(),
                self.data_type().fixed_size(),
            ));
        }
        self.store_array(ArrayBytes::from(transmute_to_bytes_vec(elements)))
    }

    /// Erase the chunk at `chunk_indices`. Succeeds if the chunk is not
    /// stored.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` are invalid or there is
    /// an underlying store error.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        self.chunk_grid().validate_chunk_indices(chunk_indices)?;
        Ok(self.storage.erase(&self.chunk_key(chunk_indices))?)
    }

    /// Erase all chunks of the array.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] on an underlying store error.
    pub fn erase_chunks(&self) -> Result<(), ArrayError> {
        let chunks =
            crate::array_subset::ArraySubset::new_with_shape(self.chunk_grid().grid_shape());
        let chunk_indices: Vec<Vec<u64>> = chunks.indices().into_iter().collect();
        chunk_indices
            .into_par_iter()
            .try_for_each(|chunk_indices| self.erase_chunk(&chunk_indices))
    }

    /// Cut the block of `array_bytes` covered by the chunk at
    /// `chunk_indices`, pad it to the chunk shape if it is an edge chunk,
    /// and store it.
    fn store_array_chunk(
        &self,
        chunk_indices: &[u64],
        array_bytes: &ArrayBytes<'_>,
    ) -> Result<(), ArrayError> {
        let chunk_subset = self.chunk_subset(chunk_indices)?;
        let chunk_subset_bounded = self.chunk_subset_bounded(chunk_indices)?;
        let block =
            array_bytes.extract_array_subset(&chunk_subset_bounded, self.shape(), self.data_type())?;
        if chunk_subset_bounded.shape() == chunk_subset.shape() {
            return self.store_chunk(chunk_indices, block);
        }

        // edge chunk, pad the tail positions with the fill value
        let chunk_shape = self.chunk_grid().chunk_shape_u64();
        let block_subset = chunk_subset_bounded.relative_to(chunk_subset.start())?;
        let chunk_bytes = match self.data_type().size() {
            DataTypeSize::Fixed(element_size) => {
                let block = block.into_fixed()?;
                ArrayBytes::from(pad_fixed_chunk(
                    &block,
                    &block_subset,
                    &chunk_shape,
                    self.fill_value(),
                    element_size,
                ))
            }
            DataTypeSize::Variable => {
                let (payload, offsets) = block.into_variable()?;
                let (payload, offsets) = pad_variable_chunk(
                    &payload,
                    &offsets,
                    block_subset.shape(),
                    &chunk_shape,
                    self.fill_value(),
                );
                ArrayBytes::new_vlen(payload, offsets)
            }
        };
        self.store_chunk(chunk_indices, chunk_bytes)
    }
}
