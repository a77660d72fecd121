//! Bytes→bytes codecs.

pub mod zstd;
