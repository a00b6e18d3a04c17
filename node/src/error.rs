use std::{error::Error, fmt, io};

use machine_learning::MlErr;

/// The node's error type.
#[derive(Debug)]
pub enum NodeErr {
    Config(String),
    Io(io::Error),
    Json(serde_json::Error),
    Ml(MlErr),
}

impl fmt::Display for NodeErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeErr::Config(reason) => write!(f, "invalid configuration: {reason}"),
            NodeErr::Io(e) => write!(f, "io error: {e}"),
            NodeErr::Json(e) => write!(f, "invalid JSON: {e}"),
            NodeErr::Ml(e) => write!(f, "{e}"),
        }
    }
}

impl Error for NodeErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NodeErr::Config(_) => None,
            NodeErr::Io(e) => Some(e),
            NodeErr::Json(e) => Some(e),
            NodeErr::Ml(e) => Some(e),
        }
    }
}

impl From<io::Error> for NodeErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for NodeErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<MlErr> for NodeErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}
