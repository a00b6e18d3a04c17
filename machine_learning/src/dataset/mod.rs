mod loader;
mod point;
mod synthetic;

pub use loader::{DataFormat, Dataset, load_data, load_libsvm, load_tsv};
pub use point::{Features, LabeledPoint, SparseVec};
pub use synthetic::two_blobs;
