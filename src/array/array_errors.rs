use thiserror::Error;

use crate::array_subset::{ArraySubset, IncompatibleDimensionalityError};
use crate::storage::{NodePathError, StorageError};

use super::chunk_grid::InvalidChunkGridIndicesError;
use super::codec::{CodecChainCreateError, CodecError};
use super::data_type::{
    IncompatibleFillValueError, IncompatibleFillValueMetadataError, UnsupportedDataTypeError,
};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Unsupported data type.
    #[error(transparent)]
    DataTypeCreateError(#[from] UnsupportedDataTypeError),
    /// Invalid fill value metadata.
    #[error(transparent)]
    InvalidFillValueMetadata(#[from] IncompatibleFillValueMetadataError),
    /// The fill value is incompatible with the data type.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// Error creating the codec chain.
    #[error(transparent)]
    CodecsCreateError(#[from] CodecChainCreateError),
    /// The codec chain does not support the data type.
    #[error(transparent)]
    CodecsIncompatibleError(#[from] CodecError),
    /// The chunk shape is invalid.
    #[error("invalid chunk shape {0:?}, expected non-zero extents")]
    InvalidChunkShape(Vec<u64>),
    /// The dimensionality of the chunk shape does not match the array shape.
    #[error("chunk shape dimensionality {0} does not match array dimensionality {1}")]
    InvalidChunkShapeDimensionality(usize, usize),
    /// The number of dimension names does not match the array dimensionality.
    #[error("the number of dimension names {0} does not match array dimensionality {1}")]
    InvalidDimensionNames(usize, usize),
    /// Storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An error deserializing the metadata.
    #[error(transparent)]
    MetadataDeserializationError(#[from] serde_json::Error),
    /// Missing metadata.
    #[error("array metadata is missing")]
    MissingMetadata,
}

/// Array errors.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// An error decoding the stored bytes of a chunk.
    #[error("error decoding chunk {_0:?}: {_1}")]
    ChunkDecodeError(Vec<u64>, CodecError),
    /// Invalid chunk grid indices.
    #[error(transparent)]
    InvalidChunkGridIndicesError(#[from] InvalidChunkGridIndicesError),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    /// Incompatible array subset.
    #[error("array subset {_0} is not compatible with array shape {_1:?}")]
    InvalidArraySubset(ArraySubset, Vec<u64>),
    /// Incompatible chunk subset.
    #[error("chunk subset {_0} is not compatible with chunk {_1:?} with shape {_2:?}")]
    InvalidChunkSubset(ArraySubset, Vec<u64>, Vec<u64>),
    /// A subsampling step is zero.
    #[error("subsampling steps {_0:?} are invalid, steps must be non-zero")]
    InvalidSubsamplingSteps(Vec<u64>),
    /// Incompatible element size.
    #[error("got element size {_0}, expected {_1:?}")]
    IncompatibleElementSize(usize, Option<usize>),
    /// The method does not support the data type.
    #[error("data type {_0} is not supported by {_1}")]
    UnsupportedDataType(super::DataType, String),
}
