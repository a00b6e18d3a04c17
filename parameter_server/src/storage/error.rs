use std::{
    error::Error,
    fmt::{self, Display},
};

/// The specific result type for size mismatch checks inside the storage module.
pub type Result<T> = std::result::Result<T, SizeMismatchErr>;

/// Error returned whenever a delta, an output buffer or an index doesn't fit the
/// amount of parameters held by a shard or a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatchErr {
    pub got: usize,
    pub expected: usize,
}

impl Display for SizeMismatchErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parameter storage error: got a buffer of length {}, expected {}",
            self.got, self.expected
        )
    }
}

impl Error for SizeMismatchErr {}
