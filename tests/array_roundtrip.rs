use std::sync::Arc;

use gridstore::array::codec::ZstdCodec;
use gridstore::array::{Array, ArrayBuilder, ArrayBytes, ArrayError, DataType, FillValue};
use gridstore::array_subset::ArraySubset;
use gridstore::storage::{
    FilesystemStore, MemoryStore, ReadableStorageTraits, ReadableWritableStorageTraits,
    WritableStorageTraits,
};

fn array_write_read<TStorage: ?Sized + ReadableWritableStorageTraits>(
    array: Array<TStorage>,
) -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(array.data_type(), &DataType::UInt8);
    assert_eq!(array.fill_value().as_ne_bytes(), &[0u8]);
    assert_eq!(array.shape(), &[4, 4]);
    assert_eq!(array.chunk_grid().grid_shape(), vec![2, 2]);

    // 1  2 | 3  4
    // 5  6 | 7  8
    // -----|-----
    // 9 10 | 0  0
    // 0  0 | 0  0
    array.store_chunk_elements(&[0, 0], vec![1u8, 2, 5, 6])?;
    array.store_chunk_elements(&[0, 1], vec![3u8, 4, 7, 8])?;
    array.store_chunk_elements(&[1, 0], vec![9u8, 10, 0, 0])?;

    assert!(array.retrieve_chunk(&[0, 0, 0]).is_err());
    assert_eq!(array.retrieve_chunk_elements::<u8>(&[0, 0])?, vec![1, 2, 5, 6]);
    assert_eq!(array.retrieve_chunk_elements::<u8>(&[0, 1])?, vec![3, 4, 7, 8]);
    assert_eq!(array.retrieve_chunk_elements::<u8>(&[1, 0])?, vec![9, 10, 0, 0]);
    // unwritten chunk reads as the fill value
    assert_eq!(array.retrieve_chunk_elements::<u8>(&[1, 1])?, vec![0, 0, 0, 0]);

    assert_eq!(
        array.retrieve_array_subset_elements::<u8>(&ArraySubset::new_with_ranges(&[0..4, 0..4]))?,
        vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 0, 0, 0, 0, 0, 0]
    );
    assert_eq!(
        array.retrieve_array_subset_elements::<u8>(&ArraySubset::new_with_ranges(&[1..3, 1..3]))?,
        vec![6, 7, 10, 0]
    );
    assert_eq!(
        array.retrieve_array_subset_elements::<u8>(&ArraySubset::new_with_ranges(&[1..2, 0..4]))?,
        vec![5, 6, 7, 8]
    );
    assert!(array
        .retrieve_array_subset(&ArraySubset::new_with_ranges(&[0..5, 0..4]))
        .is_err());

    assert_eq!(
        array.retrieve_chunk_subset_elements::<u8>(
            &[0, 0],
            &ArraySubset::new_with_ranges(&[0..2, 1..2])
        )?,
        vec![2, 6]
    );
    assert!(array
        .retrieve_chunk_subset(&[0, 0], &ArraySubset::new_with_ranges(&[0..3, 0..1]))
        .is_err());

    Ok(())
}

#[test]
fn array_write_read_memory() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![4, 4],
        DataType::UInt8,
        vec![2, 2],
        FillValue::from(0u8),
    )
    .build(store, "/array")?;
    array_write_read(array)
}

#[test]
fn array_write_read_filesystem() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::TempDir::new()?;
    let store = Arc::new(FilesystemStore::new(tmp.path())?);
    let array = ArrayBuilder::new(
        vec![4, 4],
        DataType::UInt8,
        vec![2, 2],
        FillValue::from(0u8),
    )
    .build(store, "/array")?;
    array_write_read(array)
}

#[test]
fn array_metadata_open_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(
        vec![8, 8],
        DataType::Float32,
        vec![4, 4],
        FillValue::from(f32::NAN),
    )
    .bytes_to_bytes_codecs(vec![Box::new(ZstdCodec::new(5))])
    .dimension_names(Some(["y", "x"]))
    .build(store.clone(), "/group/array")?;
    array.store_metadata()?;
    array.store_chunk_elements(&[0, 0], vec![1.0f32; 16])?;

    let array = Array::open(store, "/group/array")?;
    assert_eq!(array.shape(), &[8, 8]);
    assert_eq!(array.data_type(), &DataType::Float32);
    assert_eq!(array.retrieve_chunk_elements::<f32>(&[0, 0])?, vec![1.0f32; 16]);
    // the fill value round trips through metadata, NaN included
    assert!(array
        .retrieve_chunk_elements::<f32>(&[1, 1])?
        .iter()
        .all(|f| f.is_nan()));
    Ok(())
}

#[test]
fn array_store_array_edge_chunks() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![5], DataType::Int32, vec![2], FillValue::from(-1i32))
        .build(store.clone(), "/array")?;

    array.store_array_elements(vec![10i32, 20, 30, 40, 50])?;
    assert_eq!(
        array.retrieve_array_subset_elements::<i32>(&ArraySubset::new_with_ranges(&[0..5]))?,
        vec![10, 20, 30, 40, 50]
    );
    // the trailing chunk is stored at full shape, padded with the fill value
    assert_eq!(array.retrieve_chunk_elements::<i32>(&[2])?, vec![50, -1]);

    // a chunk of fill values erases its key rather than storing it
    array.store_chunk_elements(&[0], vec![-1i32, -1])?;
    assert!(store.get(&array.chunk_key(&[0]))?.is_none());
    assert_eq!(
        array.retrieve_array_subset_elements::<i32>(&ArraySubset::new_with_ranges(&[0..5]))?,
        vec![-1, -1, 30, 40, 50]
    );

    array.erase_chunks()?;
    assert!(store.get(&array.chunk_key(&[2]))?.is_none());
    assert_eq!(
        array.retrieve_array_subset_elements::<i32>(&ArraySubset::new_with_ranges(&[0..5]))?,
        vec![-1; 5]
    );
    Ok(())
}

#[test]
fn array_subsampled_read() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![8], DataType::UInt16, vec![4], FillValue::from(0u16))
        .build(store, "/array")?;
    array.store_array_elements((0u16..8).collect::<Vec<_>>())?;

    let (elements, shape) = array
        .retrieve_array_subset_subsampled_elements::<u16>(&ArraySubset::new_with_ranges(&[1..4]), &[2])?;
    assert_eq!(shape, vec![2]);
    assert_eq!(elements, vec![1, 3]);

    // step crossing the chunk boundary
    let (elements, shape) = array
        .retrieve_array_subset_subsampled_elements::<u16>(&ArraySubset::new_with_ranges(&[0..8]), &[3])?;
    assert_eq!(shape, vec![3]);
    assert_eq!(elements, vec![0, 3, 6]);

    // step of one is a plain windowed read
    let (elements, shape) = array
        .retrieve_array_subset_subsampled_elements::<u16>(&ArraySubset::new_with_ranges(&[2..7]), &[1])?;
    assert_eq!(shape, vec![5]);
    assert_eq!(elements, vec![2, 3, 4, 5, 6]);

    assert!(matches!(
        array.retrieve_array_subset_subsampled(&ArraySubset::new_with_ranges(&[0..8]), &[0]),
        Err(ArrayError::InvalidSubsamplingSteps(_))
    ));
    Ok(())
}

#[test]
fn array_subsampled_read_2d() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![4, 6], DataType::UInt8, vec![2, 3], FillValue::from(0u8))
        .build(store, "/array")?;
    array.store_array_elements((0u8..24).collect::<Vec<_>>())?;

    let (elements, shape) = array.retrieve_array_subset_subsampled_elements::<u8>(
        &ArraySubset::new_with_ranges(&[0..4, 1..6]),
        &[2, 2],
    )?;
    assert_eq!(shape, vec![2, 3]);
    assert_eq!(elements, vec![1, 3, 5, 13, 15, 17]);
    Ok(())
}

#[test]
fn array_corrupt_chunk_reports_indices() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![8], DataType::UInt16, vec![4], FillValue::from(0u16))
        .build(store.clone(), "/array")?;
    array.store_array_elements((0u16..8).collect::<Vec<_>>())?;

    // truncate the stored bytes of the second chunk
    store.set(&array.chunk_key(&[1]), vec![0u8; 3])?;

    assert!(matches!(
        array.retrieve_chunk(&[1]),
        Err(ArrayError::ChunkDecodeError(indices, _)) if indices == vec![1]
    ));
    // the windowed and subsampled engines report the offending chunk too
    assert!(matches!(
        array.retrieve_array_subset(&ArraySubset::new_with_ranges(&[0..8])),
        Err(ArrayError::ChunkDecodeError(indices, _)) if indices == vec![1]
    ));
    assert!(matches!(
        array.retrieve_array_subset_subsampled(&ArraySubset::new_with_ranges(&[0..8]), &[3]),
        Err(ArrayError::ChunkDecodeError(indices, _)) if indices == vec![1]
    ));
    // the intact chunk still reads
    assert_eq!(array.retrieve_chunk_elements::<u16>(&[0])?, vec![0, 1, 2, 3]);
    Ok(())
}

#[test]
fn array_wide_data_type_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());

    let array = ArrayBuilder::new(vec![4], DataType::Int64, vec![2], FillValue::from(0i64))
        .build(store.clone(), "/int64")?;
    array.store_array_elements(vec![i64::MIN, -1, 0, i64::MAX])?;
    assert_eq!(
        array.retrieve_array_subset_elements::<i64>(&ArraySubset::new_with_ranges(&[0..4]))?,
        vec![i64::MIN, -1, 0, i64::MAX]
    );

    let array = ArrayBuilder::new(vec![4], DataType::UInt64, vec![2], FillValue::from(0u64))
        .build(store.clone(), "/uint64")?;
    array.store_array_elements(vec![0u64, 1, u64::MAX - 1, u64::MAX])?;
    assert_eq!(
        array.retrieve_chunk_elements::<u64>(&[1])?,
        vec![u64::MAX - 1, u64::MAX]
    );

    // eight-byte floats through the compressed chain
    let array = ArrayBuilder::new(vec![4], DataType::Float64, vec![2], FillValue::from(-1.0f64))
        .bytes_to_bytes_codecs(vec![Box::new(ZstdCodec::new(1))])
        .build(store.clone(), "/float64")?;
    array.store_array_elements(vec![f64::MIN, -0.25, 0.125, f64::MAX])?;
    assert_eq!(
        array.retrieve_array_subset_elements::<f64>(&ArraySubset::new_with_ranges(&[0..4]))?,
        vec![f64::MIN, -0.25, 0.125, f64::MAX]
    );

    let array = ArrayBuilder::new(vec![4], DataType::Bool, vec![2], FillValue::from(false))
        .build(store.clone(), "/bool")?;
    array.store_array_elements(vec![1u8, 0, 0, 1])?;
    assert_eq!(
        array.retrieve_array_subset_elements::<u8>(&ArraySubset::new_with_ranges(&[0..4]))?,
        vec![1, 0, 0, 1]
    );

    // UTF-16 code units
    let array = ArrayBuilder::new(vec![4], DataType::Char, vec![2], FillValue::from(b' ' as u16))
        .build(store, "/char")?;
    array.store_array_elements(vec![0x0067u16, 0x0072, 0x00EF, 0x0064])?;
    assert_eq!(
        array.retrieve_array_subset_elements::<u16>(&ArraySubset::new_with_ranges(&[0..4]))?,
        vec![0x0067, 0x0072, 0x00EF, 0x0064]
    );
    Ok(())
}

#[test]
fn array_string_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let array = ArrayBuilder::new(vec![4], DataType::String, vec![2], FillValue::from(""))
        .bytes_to_bytes_codecs(vec![Box::new(ZstdCodec::new(3))])
        .build(store.clone(), "/strings")?;
    array.store_metadata()?;

    array.store_chunk(&[0], ArrayBytes::new_vlen(b"abdef".as_slice(), vec![0, 2, 5]))?;

    let array = Array::open(store, "/strings")?;
    let (bytes, offsets) = array.retrieve_chunk(&[0])?.into_variable()?;
    assert_eq!(bytes.as_ref(), b"abdef");
    assert_eq!(offsets.as_ref(), &[0, 2, 5]);

    // the unwritten chunk decodes to empty-string fill values
    let (bytes, offsets) = array.retrieve_chunk(&[1])?.into_variable()?;
    assert!(bytes.is_empty());
    assert_eq!(offsets.as_ref(), &[0, 0, 0]);

    // windowed reads spanning multiple chunks need a fixed-size data type
    assert!(matches!(
        array.retrieve_array_subset(&ArraySubset::new_with_ranges(&[1..3])),
        Err(ArrayError::UnsupportedDataType(_, _))
    ));
    Ok(())
}
