//! A storage engine for chunked multidimensional ("coverage") arrays.
//!
//! An array is split into fixed-shape chunks. Each chunk is passed through a
//! [codec chain](crate::array::codec) (endianness-aware byte packing or
//! variable-length UTF-8 string packing, optionally followed by Zstandard
//! compression) and persisted as one value in a [store](crate::storage) under
//! a key derived from its chunk grid indices. A chunk that was never written
//! reads back as the array fill value, so the empty regions of a sparse
//! array cost nothing.
//!
//! The read engine retrieves an arbitrary rectangular subset of the array,
//! optionally subsampled with a per-dimension stride, decoding the
//! intersecting chunks in parallel. The write engine stores whole chunks or
//! the whole array, padding edge chunks with the fill value.
//!
//! ## Example
//! ```
//! # use std::sync::Arc;
//! use gridstore::array::{ArrayBuilder, DataType, FillValue};
//! use gridstore::array_subset::ArraySubset;
//! use gridstore::storage::store::MemoryStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let array = ArrayBuilder::new(
//!     vec![8, 8],
//!     DataType::Float32,
//!     vec![4, 4],
//!     FillValue::from(0.0f32),
//! )
//! .dimension_names(Some(["y", "x"]))
//! .build(store, "/temperature")?;
//! array.store_metadata()?;
//!
//! array.store_chunk_elements(&[0, 0], vec![1.0f32; 16])?;
//! let subset = ArraySubset::new_with_ranges(&[2..6, 2..6]);
//! let values: Vec<f32> = array.retrieve_array_subset_elements(&subset)?;
//! assert_eq!(values.len(), 16);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod array;
pub mod array_subset;
pub mod metadata;
pub mod storage;
