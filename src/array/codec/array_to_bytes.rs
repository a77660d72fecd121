//! Array→bytes codecs.

pub mod bytes;
pub mod vlen_utf8;
