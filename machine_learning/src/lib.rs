pub mod dataset;
pub mod error;
mod gradient;
pub mod model;
pub mod optimization;
pub mod training;

pub use dataset::{Features, LabeledPoint, SparseVec};
pub use error::{MlErr, Result};
pub use gradient::Gradient;
pub use model::Model;
