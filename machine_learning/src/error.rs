use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use worker::WorkerErr;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    /// A required piece of the model or the run configuration is missing or invalid.
    Precondition(&'static str),
    Unimplemented(&'static str),
    InvalidRegularization {
        norm: u32,
    },
    EmptyDataset(&'static str),
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    Parse {
        line: usize,
        reason: String,
    },
    Io(io::Error),
    Worker(WorkerErr),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::Precondition(what) => write!(f, "precondition failed: {what}"),
            MlErr::Unimplemented(what) => write!(f, "{what} is not implemented"),
            MlErr::InvalidRegularization { norm } => {
                write!(f, "there's no regularization for the L{norm} norm")
            }
            MlErr::EmptyDataset(what) => write!(f, "the {what} is empty"),
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "there's a size mismatch in {what}, got {got} and expected at most {expected}"
            ),
            MlErr::Parse { line, reason } => write!(f, "line {line}: {reason}"),
            MlErr::Io(e) => write!(f, "{e}"),
            MlErr::Worker(e) => write!(f, "{e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            MlErr::Worker(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<WorkerErr> for MlErr {
    fn from(value: WorkerErr) -> Self {
        Self::Worker(value)
    }
}
