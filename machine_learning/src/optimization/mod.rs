mod fgd;
mod gradient_descent;
pub mod regularization;
mod sgd;

pub use fgd::Fgd;
pub use gradient_descent::{GradientDescent, GradientDescentTemplate};
pub use regularization::Regularization;
pub use sgd::Sgd;
