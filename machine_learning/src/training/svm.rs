use worker::WorkerCtx;

use super::Regression;
use crate::{Result, dataset::LabeledPoint, gradient::Gradient, model::Model};

/// A linear support vector machine with labels in `{-1, +1}`.
///
/// The parameters are the feature weights followed by the bias.
pub struct Svm;

impl Svm {
    /// Builds a `Regression` configured as an L2 regularized SVM.
    ///
    /// This is a collective operation, every worker must call it with the same arguments.
    ///
    /// # Arguments
    /// * `ctx` - This worker's context.
    /// * `num_features` - The amount of features of the records.
    /// * `lambda` - The regularization factor.
    pub fn build(ctx: &WorkerCtx, num_features: usize, lambda: f32) -> Result<Regression> {
        let mut model = Model::new();
        model.set_num_param(ctx, num_features + 1)?;
        model.set_gradient_fn(Self::gradient);
        model.set_error_fn(Self::error);
        model.set_predict_fn(Self::predict);

        let mut regression = Regression::new(model);
        regression.set_regularization_factor(lambda)?;
        regression.set_round_loss(Self::hinge_loss);
        Ok(regression)
    }

    /// The ascent direction of the margin, nothing if the record is already outside of it.
    pub fn gradient(point: &LabeledPoint, params: &[f32]) -> Gradient {
        let y = point.y;
        if y * point.decision_value(params) >= 1. {
            return Gradient::new();
        }

        let Some(bias) = params.len().checked_sub(1) else {
            return Gradient::new();
        };

        let mut grad = Gradient::with_capacity(point.dim() + 1);
        point.x.for_each_nonzero(|i, x| grad.push(i, y * x));
        grad.push(bias, y);
        grad
    }

    /// `1` if the record is misclassified, `0` otherwise.
    pub fn error(point: &LabeledPoint, params: &[f32]) -> f32 {
        if point.y * point.decision_value(params) <= 0. {
            1.
        } else {
            0.
        }
    }

    pub fn predict(point: &LabeledPoint, params: &[f32]) -> f32 {
        if point.decision_value(params) >= 0. {
            1.
        } else {
            -1.
        }
    }

    pub fn hinge_loss(point: &LabeledPoint, params: &[f32]) -> f32 {
        (1. - point.y * point.decision_value(params)).max(0.)
    }
}
