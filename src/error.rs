use thiserror::Error;

/// Errors reported by the tables and their snapshots.
///
/// Every fallible operation returns one of these kinds instead of panicking.
/// Nothing in this crate retries: each operation is an immediate, deterministic
/// transformation of in-memory state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key is not present in the table.
    #[error("key not found")]
    NotFound,

    /// An index-based accessor was given an index past the end of a sequence.
    #[error("index {index} is out of range for a sequence of length {len}")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The length of the sequence at the time of the request.
        len: usize,
    },

    /// An argument could not be used to build or address a table.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The table found itself without a free slot even though the resize
    /// policy should have guaranteed one. This indicates a bug in the table.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl Error {
    /// Returns a short English description of the error kind, independent of
    /// any payload.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cellar_hash::Error;
    ///
    /// assert_eq!(Error::NotFound.description(), "Key not found");
    /// assert_eq!(
    ///     Error::OutOfRange { index: 3, len: 1 }.description(),
    ///     "Index out of range"
    /// );
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Error::NotFound => "Key not found",
            Error::OutOfRange { .. } => "Index out of range",
            Error::InvalidArgument(_) => "Invalid argument",
            Error::Internal(_) => "Internal error",
        }
    }
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
