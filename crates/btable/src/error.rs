use std::io;

use thiserror::Error;

/// Errors that can occur while encoding or decoding a BTable.
///
/// Nothing is retried or logged internally. A table that fails partway
/// through is not valid, and the caller decides what to do with it.
#[derive(Debug, Error)]
pub enum BTableError {
    /// A source value could not be interpreted as a number.
    #[error("invalid value type: {0}")]
    InvalidValueType(String),

    /// An underlying I/O error (write, read, or unexpected end of stream).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The header is truncated or its label blob is not valid UTF-16.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The header declares a format version this crate does not understand.
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    /// An input exceeds a limit of the on-disk layout (e.g. more than
    /// `u32::MAX` label units or column indices).
    #[error("format limit exceeded: {0}")]
    LimitExceeded(String),

    /// A decoded column index lies outside the header's column count.
    #[error("row index {index} out of range for {columns} columns")]
    RowIndexOutOfRange { index: u32, columns: usize },

    /// A write was attempted outside the `WritingRows` state, or after an
    /// earlier write to the sink failed.
    #[error("invalid writer state: {0}")]
    InvalidState(&'static str),

    /// Strict mode: a row's length differs from the header column count.
    #[error("row has {actual} values, header declares {expected} columns")]
    RowLengthMismatch { expected: usize, actual: usize },

    /// Strict mode: a decoded index is not greater than the one before it.
    #[error("column index {index} does not follow {previous}")]
    UnorderedIndex { previous: u32, index: u32 },
}

/// Shorthand for results produced by this crate.
pub type Result<T> = std::result::Result<T, BTableError>;
