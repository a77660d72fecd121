use std::num::NonZeroU64;
use std::sync::Arc;

use crate::storage::NodePath;

use super::codec::{ArrayToBytesCodecTraits, BytesCodec, BytesToBytesCodecTraits, VlenUtf8Codec};
use super::data_type::IncompatibleFillValueError;
use super::{
    Array, ArrayCreateError, ArrayShape, ChunkKeyEncoding, ChunkKeySeparator, CodecChain,
    DataType, DimensionName, FillValue, RegularChunkGrid,
};

/// An [`Array`] builder.
///
/// The array builder is initialised from an array shape, data type, chunk
/// shape, and fill value.
///  - The default array→bytes codec is `bytes` with little endian encoding
///    for fixed-size data types, or `vlen-utf8` for strings. No bytes→bytes
///    codecs are enabled by default, so the output is uncompressed.
///  - The default chunk key separator is `/`.
///  - Dimension names are empty.
///
/// Use the methods in the array builder to change the configuration away from
/// these defaults, then build the array at a path of some storage with
/// [`ArrayBuilder::build`]. Note that [`build`](ArrayBuilder::build) does not
/// modify the store; the array metadata has to be explicitly written with
/// [`Array::store_metadata`].
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use gridstore::array::{ArrayBuilder, DataType, FillValue};
/// use gridstore::array::codec::ZstdCodec;
/// # let store = Arc::new(gridstore::storage::store::MemoryStore::new());
/// let array = ArrayBuilder::new(
///     vec![8, 8], // array shape
///     DataType::Float32,
///     vec![4, 4], // chunk shape
///     FillValue::from(0.0f32),
/// )
/// .bytes_to_bytes_codecs(vec![Box::new(ZstdCodec::new(5))])
/// .dimension_names(Some(["y", "x"]))
/// .build(store.clone(), "/group/array")?;
/// array.store_metadata()?; // write metadata to the store
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArrayBuilder {
    /// Array shape.
    pub shape: ArrayShape,
    /// Data type.
    pub data_type: DataType,
    /// Chunk shape.
    pub chunk_shape: Vec<u64>,
    /// Chunk key separator.
    pub chunk_key_separator: ChunkKeySeparator,
    /// Fill value.
    pub fill_value: FillValue,
    /// Array to bytes codec.
    pub array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits>,
    /// Bytes to bytes codecs.
    pub bytes_to_bytes_codecs: Vec<Box<dyn BytesToBytesCodecTraits>>,
    /// Dimension names.
    pub dimension_names: Option<Vec<DimensionName>>,
}

impl ArrayBuilder {
    /// Create a new array builder.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: DataType,
        chunk_shape: Vec<u64>,
        fill_value: FillValue,
    ) -> Self {
        let is_fixed_size = data_type.fixed_size().is_some();
        Self {
            shape,
            data_type,
            chunk_shape,
            chunk_key_separator: ChunkKeySeparator::default(),
            fill_value,
            array_to_bytes_codec: if is_fixed_size {
                Box::<BytesCodec>::default()
            } else {
                Box::<VlenUtf8Codec>::default()
            },
            bytes_to_bytes_codecs: Vec::default(),
            dimension_names: None,
        }
    }

    /// Set the chunk key separator.
    ///
    /// If left unmodified, the array will use the `/` chunk key separator.
    pub fn chunk_key_separator(&mut self, separator: ChunkKeySeparator) -> &mut Self {
        self.chunk_key_separator = separator;
        self
    }

    /// Set the array to bytes codec.
    ///
    /// If left unmodified, the array will default to the `bytes` codec with
    /// little endian encoding, or `vlen-utf8` for strings.
    pub fn array_to_bytes_codec(
        &mut self,
        array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits>,
    ) -> &mut Self {
        self.array_to_bytes_codec = array_to_bytes_codec;
        self
    }

    /// Set the bytes to bytes codecs.
    ///
    /// If left unmodified, the array will have no bytes to bytes codecs.
    pub fn bytes_to_bytes_codecs(
        &mut self,
        bytes_to_bytes_codecs: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> &mut Self {
        self.bytes_to_bytes_codecs = bytes_to_bytes_codecs;
        self
    }

    /// Set the dimension names.
    ///
    /// If left unmodified, all dimension names are unnamed.
    pub fn dimension_names<I, D>(&mut self, dimension_names: Option<I>) -> &mut Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DimensionName>,
    {
        self.dimension_names =
            dimension_names.map(|names| names.into_iter().map(Into::into).collect());
        self
    }

    /// Build into an [`Array`].
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the path, chunk shape, fill value, or
    /// dimension names are invalid.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        let path = NodePath::new(path)?;
        if self.chunk_shape.len() != self.shape.len() {
            return Err(ArrayCreateError::InvalidChunkShapeDimensionality(
                self.chunk_shape.len(),
                self.shape.len(),
            ));
        }
        let chunk_shape: Vec<NonZeroU64> = self
            .chunk_shape
            .iter()
            .map(|&extent| NonZeroU64::new(extent))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ArrayCreateError::InvalidChunkShape(self.chunk_shape.clone()))?;
        let chunk_grid = RegularChunkGrid::new(self.shape.clone(), chunk_shape).map_err(|_| {
            ArrayCreateError::InvalidChunkShapeDimensionality(
                self.chunk_shape.len(),
                self.shape.len(),
            )
        })?;
        if let Some(dimension_names) = &self.dimension_names {
            if dimension_names.len() != self.shape.len() {
                return Err(ArrayCreateError::InvalidDimensionNames(
                    dimension_names.len(),
                    self.shape.len(),
                ));
            }
        }
        if let Some(data_type_size) = self.data_type.fixed_size() {
            if data_type_size != self.fill_value.size() {
                return Err(IncompatibleFillValueError::new(
                    self.data_type.identifier(),
                    self.fill_value.clone(),
                )
                .into());
            }
        }
        // reject fill values that cannot round trip through metadata
        self.data_type.metadata_fill_value(&self.fill_value)?;

        let codecs = CodecChain::new(
            self.array_to_bytes_codec.clone(),
            self.bytes_to_bytes_codecs.clone(),
        );
        // reject chains whose array to bytes codec cannot handle the data type
        codecs.compute_encoded_size(&super::ArrayRepresentation::new(
            chunk_grid.chunk_shape_u64(),
            self.data_type.clone(),
            self.fill_value.clone(),
        )?)?;

        Ok(Array {
            storage,
            path,
            shape: self.shape.clone(),
            data_type: self.data_type.clone(),
            chunk_grid,
            chunk_key_encoding: ChunkKeyEncoding::new(self.chunk_key_separator),
            fill_value: self.fill_value.clone(),
            codecs,
            dimension_names: self.dimension_names.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    #[test]
    fn array_builder_defaults() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(
            vec![8, 8],
            DataType::Float32,
            vec![4, 4],
            FillValue::from(0.0f32),
        )
        .build(store, "/array")
        .unwrap();
        assert_eq!(array.chunk_grid().grid_shape(), vec![2, 2]);
        let metadata = array.metadata();
        assert_eq!(metadata.codecs.len(), 1);
        assert_eq!(metadata.codecs[0].name(), "bytes");
    }

    #[test]
    fn array_builder_string_defaults_to_vlen_utf8() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(
            vec![4],
            DataType::String,
            vec![2],
            FillValue::from(""),
        )
        .build(store, "/strings")
        .unwrap();
        assert_eq!(array.metadata().codecs[0].name(), "vlen-utf8");
    }

    #[test]
    fn array_builder_invalid_path() {
        let store = Arc::new(MemoryStore::new());
        let builder = ArrayBuilder::new(
            vec![4],
            DataType::UInt8,
            vec![2],
            FillValue::from(0u8),
        );
        assert!(matches!(
            builder.build(store, "array"),
            Err(ArrayCreateError::NodePathError(_))
        ));
    }

    #[test]
    fn array_builder_zero_chunk_extent() {
        let store = Arc::new(MemoryStore::new());
        let builder = ArrayBuilder::new(
            vec![4, 4],
            DataType::UInt8,
            vec![2, 0],
            FillValue::from(0u8),
        );
        assert!(matches!(
            builder.build(store, "/array"),
            Err(ArrayCreateError::InvalidChunkShape(_))
        ));
    }

    #[test]
    fn array_builder_chunk_shape_dimensionality() {
        let store = Arc::new(MemoryStore::new());
        let builder = ArrayBuilder::new(
            vec![4, 4],
            DataType::UInt8,
            vec![2],
            FillValue::from(0u8),
        );
        assert!(matches!(
            builder.build(store, "/array"),
            Err(ArrayCreateError::InvalidChunkShapeDimensionality(1, 2))
        ));
    }

    #[test]
    fn array_builder_fill_value_mismatch() {
        let store = Arc::new(MemoryStore::new());
        let builder = ArrayBuilder::new(
            vec![4],
            DataType::Int32,
            vec![2],
            FillValue::from(0u8),
        );
        assert!(matches!(
            builder.build(store, "/array"),
            Err(ArrayCreateError::InvalidFillValue(_))
        ));
    }
}
