//! Chunked N-dimensional arrays.
//!
//! An array holds multidimensional data split into chunks of uniform shape,
//! each encoded through a codec chain and stored at a key derived from its
//! chunk grid indices. Use [`ArrayBuilder`] to set up a new array, or
//! [`Array::open`] for an array with existing metadata in a store.

mod array_builder;
pub mod array_bytes;
mod array_errors;
mod array_read;
mod array_representation;
mod array_write;
/// The byte-level representation between codec pipeline stages.
pub mod bytes_representation;
pub mod chunk_grid;
pub mod chunk_key_encoding;
pub mod codec;
pub mod data_type;
pub mod dimension_name;
/// The byte order of multi-byte elements.
pub mod endianness;
pub mod fill_value;
mod unsafe_cell_slice;

use std::sync::Arc;

pub use self::{
    array_builder::ArrayBuilder,
    array_bytes::ArrayBytes,
    array_errors::{ArrayCreateError, ArrayError},
    array_representation::ArrayRepresentation,
    bytes_representation::BytesRepresentation,
    chunk_grid::RegularChunkGrid,
    chunk_key_encoding::{ChunkKeyEncoding, ChunkKeySeparator},
    codec::CodecChain,
    data_type::{DataType, DataTypeSize},
    dimension_name::DimensionName,
    endianness::Endianness,
    fill_value::FillValue,
    unsafe_cell_slice::UnsafeCellSlice,
};

use crate::array_subset::{ArraySubset, IncompatibleDimensionalityError};
use crate::metadata::ArrayMetadata;
use crate::storage::{data_key, meta_key, NodePath, ReadableStorageTraits, StoreKey};

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// A chunked N-dimensional array.
///
/// An array is defined by the following parameters, encoded in its JSON
/// metadata:
///  - **shape**: the length of each array dimension,
///  - **data type**: the representation of array elements,
///  - **chunk grid**: how the array is subdivided into chunks,
///  - **chunk key encoding**: how chunk grid indices map to store keys,
///  - **fill value**: the element value of unwritten portions of the array,
///  - **codecs**: the chain used to encode and decode chunks,
///  - **dimension names** (optional).
///
/// A missing chunk is not an error; reading it yields the fill value. Writing
/// a chunk whose elements all equal the fill value erases its key.
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the array in the store.
    path: NodePath,
    /// The length of each dimension of the array.
    shape: ArrayShape,
    /// The data type of the array.
    data_type: DataType,
    /// The chunk grid of the array.
    chunk_grid: RegularChunkGrid,
    /// The mapping from chunk grid indices to keys in the underlying store.
    chunk_key_encoding: ChunkKeyEncoding,
    /// The element value of unwritten portions of the array.
    fill_value: FillValue,
    /// The codecs used for encoding and decoding chunks.
    codecs: CodecChain,
    /// An optional list of dimension names.
    dimension_names: Option<Vec<DimensionName>>,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata`.
    ///
    /// This does **not** write to the store, use
    /// [`store_metadata`](Array::store_metadata) to write the metadata to
    /// `storage`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if any metadata is invalid.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadata,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;
        let data_type = DataType::from_metadata(&metadata.data_type)?;
        if metadata.chunk_shape.len() != metadata.shape.len() {
            return Err(ArrayCreateError::InvalidChunkShapeDimensionality(
                metadata.chunk_shape.len(),
                metadata.shape.len(),
            ));
        }
        let chunk_grid = RegularChunkGrid::new(metadata.shape.clone(), metadata.chunk_shape)
            .map_err(|_| {
                ArrayCreateError::InvalidChunkShapeDimensionality(0, metadata.shape.len())
            })?;
        let fill_value = match &metadata.fill_value {
            Some(fill_value) => data_type.fill_value_from_metadata(fill_value)?,
            None => data_type.default_fill_value(),
        };
        if let DataTypeSize::Fixed(size) = data_type.size() {
            if fill_value.size() != size {
                return Err(ArrayCreateError::InvalidFillValue(
                    data_type::IncompatibleFillValueError::new(
                        data_type.identifier(),
                        fill_value,
                    ),
                ));
            }
        }
        let codecs = CodecChain::from_metadata(&metadata.codecs)?;
        if let Some(dimension_names) = &metadata.dimension_names {
            if dimension_names.len() != metadata.shape.len() {
                return Err(ArrayCreateError::InvalidDimensionNames(
                    dimension_names.len(),
                    metadata.shape.len(),
                ));
            }
        }

        Ok(Self {
            storage,
            path,
            shape: metadata.shape,
            data_type,
            chunk_grid,
            chunk_key_encoding: ChunkKeyEncoding::new(metadata.chunk_key_separator),
            fill_value,
            codecs,
            dimension_names: metadata.dimension_names,
        })
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Get the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Get the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Get the codecs.
    #[must_use]
    pub const fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// Get the chunk grid.
    #[must_use]
    pub const fn chunk_grid(&self) -> &RegularChunkGrid {
        &self.chunk_grid
    }

    /// Get the chunk key encoding.
    #[must_use]
    pub const fn chunk_key_encoding(&self) -> &ChunkKeyEncoding {
        &self.chunk_key_encoding
    }

    /// Get the dimension names.
    #[must_use]
    pub const fn dimension_names(&self) -> &Option<Vec<DimensionName>> {
        &self.dimension_names
    }

    /// Create [`ArrayMetadata`] matching this array.
    #[must_use]
    pub fn metadata(&self) -> ArrayMetadata {
        let fill_value = self
            .data_type
            .metadata_fill_value(&self.fill_value)
            .expect("the fill value was validated on creation");
        ArrayMetadata {
            shape: self.shape.clone(),
            data_type: self.data_type.identifier().to_string(),
            chunk_shape: self.chunk_grid.chunk_shape().to_vec(),
            chunk_key_separator: self.chunk_key_encoding.separator(),
            fill_value: Some(fill_value),
            codecs: self.codecs.create_metadatas(),
            dimension_names: self.dimension_names.clone(),
        }
    }

    /// The store key of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        data_key(&self.path, &self.chunk_key_encoding.encode(chunk_indices))
    }

    /// Return the array subset of the chunk at `chunk_indices`, always full
    /// chunk shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the
    /// `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        Ok(self.chunk_grid.subset(chunk_indices)?)
    }

    /// Return the array subset of the chunk at `chunk_indices` bounded by the
    /// array shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the
    /// `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_subset_bounded(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        Ok(self.chunk_grid.subset_bounded(chunk_indices)?)
    }

    /// Get the array representation of the chunk at `chunk_indices`.
    ///
    /// All chunks share a representation since edge chunks are stored
    /// full-size.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the
    /// `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_array_representation(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ArrayRepresentation, ArrayError> {
        self.chunk_grid.validate_chunk_indices(chunk_indices)?;
        Ok(ArrayRepresentation::new(
            self.chunk_grid.chunk_shape_u64(),
            self.data_type.clone(),
            self.fill_value.clone(),
        )
        .expect("the fill value was validated on creation"))
    }

    /// Return an array subset indicating the chunks intersecting
    /// `array_subset`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the array subset has an
    /// incorrect dimensionality.
    pub fn chunks_in_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        self.chunk_grid.chunks_in_array_subset(array_subset)
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Open an array in `storage` at `path` from existing metadata.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if there is a storage error, the metadata
    /// is missing, or the metadata is invalid.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let node_path = NodePath::new(path)?;
        let metadata_bytes = storage
            .get(&meta_key(&node_path))?
            .ok_or(ArrayCreateError::MissingMetadata)?;
        let metadata: ArrayMetadata = serde_json::from_slice(&metadata_bytes)?;
        Self::new_with_metadata(storage, path, metadata)
    }
}

/// Unravel a linearised index to ND indices.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Ravel ND indices to a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        index += i * count;
        count *= s;
    }
    index
}

/// Transmute a [`Vec`] of elements to bytes, avoiding an allocation where
/// possible.
#[must_use]
pub fn transmute_to_bytes_vec<T: bytemuck::Pod>(from: Vec<T>) -> Vec<u8> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_err, from)| bytemuck::cast_slice(&from).to_vec())
}

/// Transmute a [`Vec`] of bytes to elements, avoiding an allocation where
/// possible.
#[must_use]
pub fn transmute_from_bytes_vec<T: bytemuck::Pod>(from: Vec<u8>) -> Vec<T> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_err, from)| bytemuck::allocation::pod_collect_to_vec(&from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;
    use crate::storage::WritableStorageTraits;

    #[test]
    fn ravel_unravel() {
        let shape = vec![2, 3, 4];
        assert_eq!(ravel_indices(&[0, 0, 0], &shape), 0);
        assert_eq!(ravel_indices(&[1, 2, 3], &shape), 23);
        assert_eq!(unravel_index(23, &shape), vec![1, 2, 3]);
        assert_eq!(unravel_index(13, &shape), vec![1, 0, 1]);
        assert_eq!(ravel_indices(&unravel_index(13, &shape), &shape), 13);
    }

    #[test]
    fn transmute_round_trip() {
        let elements: Vec<u16> = vec![0x0102, 0x0304];
        let bytes = transmute_to_bytes_vec(elements.clone());
        assert_eq!(bytes.len(), 4);
        assert_eq!(transmute_from_bytes_vec::<u16>(bytes), elements);
    }

    #[test]
    fn array_metadata_write_read() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(
            vec![8, 8],
            DataType::UInt8,
            vec![4, 4],
            FillValue::from(0u8),
        )
        .dimension_names(Some(["y", "x"]))
        .build(store.clone(), "/array")
        .unwrap();
        array.store_metadata().unwrap();

        let array_open = Array::open(store, "/array").unwrap();
        assert_eq!(array_open.shape(), array.shape());
        assert_eq!(array_open.data_type(), array.data_type());
        assert_eq!(array_open.fill_value(), array.fill_value());
        assert_eq!(array_open.dimension_names(), array.dimension_names());
        assert_eq!(array_open.metadata(), array.metadata());
    }

    #[test]
    fn array_open_missing_metadata() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            Array::open(store, "/absent"),
            Err(ArrayCreateError::MissingMetadata)
        ));
    }

    #[test]
    fn array_open_invalid_metadata() {
        let store = Arc::new(MemoryStore::new());
        let path = NodePath::new("/array").unwrap();
        store
            .set(&meta_key(&path), b"not json".to_vec())
            .unwrap();
        assert!(matches!(
            Array::open(store, "/array"),
            Err(ArrayCreateError::MetadataDeserializationError(_))
        ));
    }

    #[test]
    fn array_chunk_keys() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(
            vec![4, 4],
            DataType::Int32,
            vec![2, 2],
            FillValue::from(0i32),
        )
        .build(store, "/group/array")
        .unwrap();
        assert_eq!(array.chunk_key(&[0, 1]).as_str(), "group/array/c/0/1");
    }
}
