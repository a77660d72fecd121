use rayon::prelude::*;

use crate::array_subset::ArraySubset;
use crate::storage::ReadableStorageTraits;

use super::array_bytes::{update_bytes_flen, ArrayBytes};
use super::{
    ravel_indices, transmute_from_bytes_vec, Array, ArrayError, ArrayRepresentation, ArrayShape,
    DataTypeSize, UnsafeCellSlice,
};

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Read and decode the chunk at `chunk_indices`.
    ///
    /// A missing chunk decodes to the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<ArrayBytes<'static>, ArrayError> {
        let chunk_representation = self.chunk_array_representation(chunk_indices)?;
        match self.storage.get(&self.chunk_key(chunk_indices))? {
            Some(encoded) => self.decode_chunk_bytes(encoded, chunk_indices, &chunk_representation),
            None => Ok(ArrayBytes::new_fill_value(
                chunk_representation.num_elements(),
                self.data_type(),
                self.fill_value(),
            )),
        }
    }

    /// Read and decode the chunk at `chunk_indices` into a [`Vec`] of its
    /// elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or any error of [`retrieve_chunk`](Array::retrieve_chunk).
    pub fn retrieve_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = self.retrieve_chunk(chunk_indices)?.into_fixed()?;
        Ok(transmute_from_bytes_vec(bytes.into_owned()))
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// `chunk_subset` is relative to the chunk origin.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_subset` is out of bounds of the
    /// chunk, or any error of [`retrieve_chunk`](Array::retrieve_chunk).
    pub fn retrieve_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        let chunk_shape = self.chunk_grid().chunk_shape_u64();
        if !chunk_subset.inbounds(&chunk_shape) {
            return Err(ArrayError::InvalidChunkSubset(
                chunk_subset.clone(),
                chunk_indices.to_vec(),
                chunk_shape,
            ));
        }
        let chunk_bytes = self.retrieve_chunk(chunk_indices)?;
        if chunk_subset.shape() == chunk_shape {
            Ok(chunk_bytes)
        } else {
            chunk_bytes
                .extract_array_subset(chunk_subset, &chunk_shape, self.data_type())
                .map_err(ArrayError::from)
        }
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices` into
    /// a [`Vec`] of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or any error of
    /// [`retrieve_chunk_subset`](Array::retrieve_chunk_subset).
    pub fn retrieve_chunk_subset_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = self
            .retrieve_chunk_subset(chunk_indices, chunk_subset)?
            .into_fixed()?;
        Ok(transmute_from_bytes_vec(bytes.into_owned()))
    }

    /// Read and decode the `array_subset` of the array.
    ///
    /// Chunks without stored data contribute the fill value. Chunks are
    /// processed in parallel.
    ///
    /// Arbitrary subsets are supported for fixed-size data types. For
    /// variable-sized data types the subset must lie within a single chunk.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `array_subset` is out of bounds of the array,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        if array_subset.dimensionality() != self.dimensionality()
            || !array_subset.inbounds(self.shape())
        {
            return Err(ArrayError::InvalidArraySubset(
                array_subset.clone(),
                self.shape().to_vec(),
            ));
        }

        let chunks = self.chunks_in_array_subset(array_subset)?;
        let num_chunks = chunks.num_elements_usize();
        if num_chunks == 0 {
            return Ok(ArrayBytes::new_fill_value(
                0,
                self.data_type(),
                self.fill_value(),
            ));
        }
        if num_chunks == 1 {
            let chunk_indices = chunks.start();
            let chunk_subset = self.chunk_subset(chunk_indices)?;
            return if &chunk_subset == array_subset {
                self.retrieve_chunk(chunk_indices)
            } else {
                self.retrieve_chunk_subset(
                    chunk_indices,
                    &array_subset.relative_to(chunk_subset.start())?,
                )
            };
        }

        let element_size = match self.data_type().size() {
            DataTypeSize::Fixed(size) => size,
            DataTypeSize::Variable => {
                return Err(ArrayError::UnsupportedDataType(
                    self.data_type().clone(),
                    "multi-chunk subset retrieval".to_string(),
                ))
            }
        };

        // the fill value prefill makes missing chunks a no-op
        let mut output = self
            .fill_value()
            .as_ne_bytes()
            .repeat(array_subset.num_elements_usize());
        {
            let output_slice = UnsafeCellSlice::new(&mut output);
            let chunk_indices: Vec<Vec<u64>> = chunks.indices().into_iter().collect();
            chunk_indices.into_par_iter().try_for_each(|chunk_indices| {
                self.decode_chunk_into_array_subset(
                    &chunk_indices,
                    array_subset,
                    &output_slice,
                    element_size,
                )
            })?;
        }
        Ok(ArrayBytes::from(output))
    }

    /// Read and decode the `array_subset` of the array into a [`Vec`] of its
    /// elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or any error of
    /// [`retrieve_array_subset`](Array::retrieve_array_subset).
    pub fn retrieve_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        let bytes = self.retrieve_array_subset(array_subset)?.into_fixed()?;
        Ok(transmute_from_bytes_vec(bytes.into_owned()))
    }

    /// Read and decode every `steps`-th element of the `array_subset` of the
    /// array, returning the subsampled bytes and their shape.
    ///
    /// The subsample of dimension `i` holds the elements of `array_subset` at
    /// positions `0, steps[i], 2 * steps[i], ...`, so the output shape is the
    /// per-dimension ceiling of the subset shape divided by the step. Chunks
    /// with no selected elements are not read from the store.
    ///
    /// Only fixed-size data types are supported.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `array_subset` is out of bounds of the array,
    ///  - any step is zero or `steps` has an incorrect dimensionality, or
    ///  - there is a codec or store error.
    pub fn retrieve_array_subset_subsampled(
        &self,
        array_subset: &ArraySubset,
        steps: &[u64],
    ) -> Result<(ArrayBytes<'static>, ArrayShape), ArrayError> {
        if array_subset.dimensionality() != self.dimensionality()
            || !array_subset.inbounds(self.shape())
        {
            return Err(ArrayError::InvalidArraySubset(
                array_subset.clone(),
                self.shape().to_vec(),
            ));
        }
        if steps.len() != self.dimensionality() || steps.iter().any(|&step| step == 0) {
            return Err(ArrayError::InvalidSubsamplingSteps(steps.to_vec()));
        }
        let element_size = match self.data_type().size() {
            DataTypeSize::Fixed(size) => size,
            DataTypeSize::Variable => {
                return Err(ArrayError::UnsupportedDataType(
                    self.data_type().clone(),
                    "subsampled retrieval".to_string(),
                ))
            }
        };
        if self.dimensionality() == 0 {
            return Ok((self.retrieve_chunk(&[])?, vec![]));
        }

        let output_shape: ArrayShape = std::iter::zip(array_subset.shape(), steps)
            .map(|(&size, &step)| size.div_ceil(step))
            .collect();
        let output_num_elements =
            usize::try_from(output_shape.iter().product::<u64>()).unwrap();
        let mut output = self.fill_value().as_ne_bytes().repeat(output_num_elements);
        {
            let output_slice = UnsafeCellSlice::new(&mut output);
            let chunks = self.chunks_in_array_subset(array_subset)?;
            let chunk_indices: Vec<Vec<u64>> = chunks.indices().into_iter().collect();
            chunk_indices.into_par_iter().try_for_each(|chunk_indices| {
                self.decode_chunk_subsampled(
                    &chunk_indices,
                    array_subset,
                    steps,
                    &output_shape,
                    &output_slice,
                    element_size,
                )
            })?;
        }
        Ok((ArrayBytes::from(output), output_shape))
    }

    /// Read and decode every `steps`-th element of the `array_subset` of the
    /// array into a [`Vec`] of its elements, returning the elements and their
    /// shape.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size, or any error of
    /// [`retrieve_array_subset_subsampled`](Array::retrieve_array_subset_subsampled).
    pub fn retrieve_array_subset_subsampled_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
        steps: &[u64],
    ) -> Result<(Vec<T>, ArrayShape), ArrayError> {
        self.validate_element_size::<T>()?;
        let (bytes, shape) = self.retrieve_array_subset_subsampled(array_subset, steps)?;
        Ok((transmute_from_bytes_vec(bytes.into_fixed()?.into_owned()), shape))
    }

    /// Decode the chunk at `chunk_indices` and scatter its part of
    /// `array_subset` into `output` (shaped like `array_subset`).
    ///
    /// Chunks write disjoint regions of `output`, so parallel callers over
    /// distinct chunks are safe.
    fn decode_chunk_into_array_subset(
        &self,
        chunk_indices: &[u64],
        array_subset: &ArraySubset,
        output: &UnsafeCellSlice<'_, u8>,
        element_size: usize,
    ) -> Result<(), ArrayError> {
        let chunk_subset = self.chunk_subset(chunk_indices)?;
        let overlap = chunk_subset.overlap(array_subset)?;
        if overlap.is_empty() {
            return Ok(());
        }
        let Some(encoded) = self.storage.get(&self.chunk_key(chunk_indices))? else {
            return Ok(()); // missing chunk, the output is prefilled with the fill value
        };
        let chunk_representation = self.chunk_array_representation(chunk_indices)?;
        let decoded = self.decode_chunk_bytes(encoded, chunk_indices, &chunk_representation)?;
        let chunk_shape = self.chunk_grid().chunk_shape_u64();
        let chunk_part = decoded
            .extract_array_subset(
                &overlap.relative_to(chunk_subset.start())?,
                &chunk_shape,
                self.data_type(),
            )?
            .into_fixed()?;
        // SAFETY: chunks cover disjoint overlaps of the array subset
        let output = unsafe { output.get() };
        update_bytes_flen(
            output,
            array_subset.shape(),
            &chunk_part,
            &overlap.relative_to(array_subset.start())?,
            element_size,
        );
        Ok(())
    }

    /// Decode the chunk at `chunk_indices` and scatter its selected
    /// subsampled elements into `output` (shaped like `output_shape`).
    ///
    /// The selected output positions of distinct chunks are disjoint.
    fn decode_chunk_subsampled(
        &self,
        chunk_indices: &[u64],
        array_subset: &ArraySubset,
        steps: &[u64],
        output_shape: &[u64],
        output: &UnsafeCellSlice<'_, u8>,
        element_size: usize,
    ) -> Result<(), ArrayError> {
        let chunk_subset = self.chunk_subset(chunk_indices)?;
        let overlap = chunk_subset.overlap(array_subset)?;
        if overlap.is_empty() {
            return Ok(());
        }

        // the range of output indices selected within this chunk, per dimension
        let mut k_start = Vec::with_capacity(self.dimensionality());
        let mut k_end = Vec::with_capacity(self.dimensionality());
        for (&overlap_start, overlap_end, &subset_start, &step) in itertools::izip!(
            overlap.start(),
            overlap.end_exc(),
            array_subset.start(),
            steps
        ) {
            k_start.push((overlap_start - subset_start).div_ceil(step));
            k_end.push((overlap_end - subset_start).div_ceil(step));
        }
        if std::iter::zip(&k_start, &k_end).any(|(start, end)| start >= end) {
            return Ok(()); // no selected elements, skip the read entirely
        }

        let Some(encoded) = self.storage.get(&self.chunk_key(chunk_indices))? else {
            return Ok(());
        };
        let chunk_representation = self.chunk_array_representation(chunk_indices)?;
        let decoded = self.decode_chunk_bytes(encoded, chunk_indices, &chunk_representation)?;
        let chunk_bytes = decoded.into_fixed()?;
        let chunk_shape = self.chunk_grid().chunk_shape_u64();
        let chunk_origin = chunk_subset.start();

        let inner = self.dimensionality() - 1;
        let inner_step = steps[inner];
        let inner_len = usize::try_from(k_end[inner] - k_start[inner]).unwrap();
        // SAFETY: chunks select disjoint output positions
        let output = unsafe { output.get() };
        let outer = ArraySubset::new_with_start_shape(
            k_start[..inner].to_vec(),
            std::iter::zip(&k_start[..inner], &k_end[..inner])
                .map(|(start, end)| end - start)
                .collect(),
        )?;
        for k_outer in &outer.indices() {
            let mut element_indices = Vec::with_capacity(self.dimensionality());
            for (dim, &k) in k_outer.iter().enumerate() {
                element_indices
                    .push(array_subset.start()[dim] + k * steps[dim] - chunk_origin[dim]);
            }
            element_indices
                .push(array_subset.start()[inner] + k_start[inner] * inner_step - chunk_origin[inner]);

            let mut output_indices = k_outer.clone();
            output_indices.push(k_start[inner]);
            let output_offset =
                usize::try_from(ravel_indices(&output_indices, output_shape)).unwrap()
                    * element_size;
            let source_offset =
                usize::try_from(ravel_indices(&element_indices, &chunk_shape)).unwrap()
                    * element_size;

            if inner_step == 1 {
                // selected elements are contiguous in both buffers
                let length = inner_len * element_size;
                output[output_offset..output_offset + length]
                    .copy_from_slice(&chunk_bytes[source_offset..source_offset + length]);
            } else {
                let source_stride = usize::try_from(inner_step).unwrap() * element_size;
                for k in 0..inner_len {
                    let source = source_offset + k * source_stride;
                    let target = output_offset + k * element_size;
                    output[target..target + element_size]
                        .copy_from_slice(&chunk_bytes[source..source + element_size]);
                }
            }
        }
        Ok(())
    }

    /// Decode the stored bytes of the chunk at `chunk_indices` and validate
    /// the decoded size.
    ///
    /// Codec errors are wrapped with the chunk indices so that a malformed
    /// chunk can be located.
    fn decode_chunk_bytes(
        &self,
        encoded: Vec<u8>,
        chunk_indices: &[u64],
        chunk_representation: &ArrayRepresentation,
    ) -> Result<ArrayBytes<'static>, ArrayError> {
        let decoded = self
            .codecs()
            .decode(encoded, chunk_representation)
            .map_err(|err| ArrayError::ChunkDecodeError(chunk_indices.to_vec(), err))?;
        decoded
            .validate(chunk_representation.num_elements(), self.data_type().size())
            .map_err(|err| ArrayError::ChunkDecodeError(chunk_indices.to_vec(), err))?;
        Ok(decoded)
    }

    /// Check that the size of `T` matches the size of the data type.
    fn validate_element_size<T>(&self) -> Result<(), ArrayError> {
        if self.data_type().fixed_size() == Some(core::mem::size_of::<T>()) {
            Ok(())
        } else {
            Err(ArrayError::IncompatibleElementSize(
                core::mem::size_of::<T>(),
                self.data_type().fixed_size(),
            ))
        }
    }
}
