mod early_stopping;
mod regression;
mod svm;

pub use early_stopping::{EarlyStopping, StopReason};
pub use regression::{Regression, TrainingReport};
pub use svm::Svm;
