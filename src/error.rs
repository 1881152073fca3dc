// sixela::error
//
// TOC
// - enum SixelError
// - type SixelResult

/// Error kinds returned by this crate's codec entry points.
///
/// # Adaptation
/// - Derived from the `SIXELSTATUS` taxonomy in the `libsixel` C library
///   (`SIXEL_BAD_ARGUMENT`, `SIXEL_BAD_ALLOCATION`, ... ), flattened into a
///   single enum since this crate has no C ABI boundary to preserve bit
///   patterns for, and no side-channel "additional message" slot: each
///   variant's text is fixed at the call site via `#[error(...)]`.
#[derive(Debug, thiserror::Error)]
pub enum SixelError {
    /// A `NULL` or out-of-range parameter was supplied at an API boundary.
    #[error("bad argument")]
    BadArgument,

    /// An allocation through the configured allocator failed.
    #[error("allocation failed")]
    BadAllocation,

    /// Malformed SIXEL data, a corrupt frame, or a directory given as input.
    #[error("bad input")]
    BadInput,

    /// Parameter arithmetic would overflow.
    #[error("integer overflow")]
    BadIntegerOverflow,

    /// A state-machine or I/O condition that is not representable as a raw
    /// OS error (a `select` failure, an internal invariant about to be
    /// violated by a caller).
    #[error("runtime error: {0}")]
    Runtime(&'static str),

    /// Internal invariant breach — a bug in this crate, not the caller.
    #[error("logic error: {0}")]
    Logic(&'static str),

    /// An optional feature was not compiled in.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// The caller's cancel flag was observed mid-operation.
    #[error("interrupted")]
    Interrupted,

    /// Low-level I/O failure (open/read/write).
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for this crate's fallible return type.
pub type SixelResult<T> = Result<T, SixelError>;
