use std::{error::Error, fmt};

use parameter_server::SizeMismatchErr;

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Worker runtime failures.
#[derive(Debug)]
pub enum WorkerErr {
    SizeMismatch(SizeMismatchErr),
    IndexOutOfBounds {
        index: usize,
        len: usize,
    },
    /// Two workers resolved the same collective slot to different object types, meaning
    /// they didn't run the same sequence of collective calls.
    CollectiveMismatch {
        slot: usize,
    },
    InputCount {
        got: usize,
        expected: usize,
    },
    Join(String),
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::SizeMismatch(e) => write!(f, "{e}"),
            WorkerErr::IndexOutOfBounds { index, len } => {
                write!(f, "parameter index {index} is out of bounds for length {len}")
            }
            WorkerErr::CollectiveMismatch { slot } => write!(
                f,
                "collective slot {slot} was created with a different type by another worker"
            ),
            WorkerErr::InputCount { got, expected } => {
                write!(f, "got {got} worker inputs, expected one per worker ({expected})")
            }
            WorkerErr::Join(detail) => write!(f, "worker task failed: {detail}"),
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::SizeMismatch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SizeMismatchErr> for WorkerErr {
    fn from(value: SizeMismatchErr) -> Self {
        Self::SizeMismatch(value)
    }
}
