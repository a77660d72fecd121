use derive_more::Display;

/// The byte-level representation between codec pipeline stages.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum BytesRepresentation {
    /// The size is known exactly.
    #[display("fixed size: {_0}")]
    FixedSize(u64),
    /// The size has a known upper bound.
    #[display("bounded size: {_0}")]
    BoundedSize(u64),
    /// The size is indeterminate.
    #[display("unbounded size")]
    UnboundedSize,
}

impl BytesRepresentation {
    /// Return the fixed or bounded size, or [`None`] if the size is
    /// unbounded.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        match self {
            Self::FixedSize(size) | Self::BoundedSize(size) => Some(*size),
            Self::UnboundedSize => None,
        }
    }
}
