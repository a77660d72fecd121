//! Storage: abstract key-value stores holding array metadata and chunks.
//!
//! A store maps [`StoreKey`]s to byte values. Array metadata lives at the
//! `zarr.json` key below the array prefix and chunks live at keys produced by
//! the array's chunk key encoding, e.g. `temperature/c/0/1`. A missing chunk
//! key is not an error; it denotes a chunk entirely equal to the fill value.

pub mod node_path;
pub mod store;
pub mod store_key;
pub mod store_prefix;

pub use node_path::{NodePath, NodePathError};
pub use store::{FilesystemStore, FilesystemStoreCreateError, MemoryStore};
pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError, StorePrefixes};

use thiserror::Error;

/// The value of a store key, or [`None`] if the key is absent.
pub type MaybeBytes = Option<Vec<u8>>;

/// Readable storage.
pub trait ReadableStorageTraits: Send + Sync {
    /// Retrieve the value at `key`, or [`None`] if the key is absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the underlying store fails.
    fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError>;

    /// Return the size in bytes of the value at `key`, or [`None`] if the key
    /// is absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the underlying store fails.
    fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError>;
}

/// Writable storage.
pub trait WritableStorageTraits: Send + Sync {
    /// Store `value` at `key`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on failure to store.
    fn set(&self, key: &StoreKey, value: Vec<u8>) -> Result<(), StorageError>;

    /// Erase the value at `key`. Succeeds if the key is absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the underlying store fails.
    fn erase(&self, key: &StoreKey) -> Result<(), StorageError>;

    /// Erase all values with keys below `prefix`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the underlying store fails.
    fn erase_prefix(&self, prefix: &StorePrefix) -> Result<(), StorageError>;
}

/// Listable storage.
pub trait ListableStorageTraits: Send + Sync {
    /// Retrieve all keys in the store, sorted.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the underlying store fails.
    fn list(&self) -> Result<StoreKeys, StorageError>;

    /// Retrieve all keys below `prefix`, sorted.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the underlying store fails.
    fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError>;
}

/// Readable and writable storage.
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}

impl<T: ReadableStorageTraits + WritableStorageTraits> ReadableWritableStorageTraits for T {}

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An error parsing the metadata for a key.
    #[error("error parsing metadata for {0}: {1}")]
    InvalidMetadata(StoreKey, String),
    /// An invalid store prefix.
    #[error(transparent)]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error(transparent)]
    InvalidStoreKey(#[from] StoreKeyError),
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Return the metadata key (`zarr.json`) given a node path.
#[must_use]
pub fn meta_key(path: &NodePath) -> StoreKey {
    let path = path.as_str();
    if path.eq("/") {
        // SAFETY: `zarr.json` is a valid key
        unsafe { StoreKey::new_unchecked("zarr.json".to_string()) }
    } else {
        let path = path.strip_prefix('/').unwrap_or(path);
        // SAFETY: a valid non-root node path joined to `zarr.json` is a valid key
        unsafe { StoreKey::new_unchecked(format!("{path}/zarr.json")) }
    }
}

/// Return the data key given a node path and an encoded chunk key.
#[must_use]
pub fn data_key(path: &NodePath, chunk_key: &StoreKey) -> StoreKey {
    let path = path.as_str();
    let path = path.strip_prefix('/').unwrap_or(path);
    if path.is_empty() {
        chunk_key.clone()
    } else {
        // SAFETY: joining two valid components with `/` yields a valid key
        unsafe { StoreKey::new_unchecked(format!("{path}/{}", chunk_key.as_str())) }
    }
}
