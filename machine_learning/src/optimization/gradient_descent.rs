use worker::{ParameterVector, Partition, WorkerCtx};

use super::Regularization;
use crate::{MlErr, Result, dataset::LabeledPoint, model::GradientFn};

/// Executes a single synchronized round of parameter updates.
///
/// Every worker runs its own instance over its own partition, the updates are merged when
/// the round ends so every worker starts the next one from the same parameters.
#[trait_variant::make(GradientDescent: Send)]
pub trait GradientDescentTemplate {
    /// Returns a new engine.
    ///
    /// # Arguments
    /// * `gradient_fn` - Computes the gradient of a single record.
    /// * `learning_rate` - The *length* of the steps taken on `update_params`.
    fn with_gradient(gradient_fn: GradientFn, learning_rate: f32) -> Self;

    fn set_regularization(&mut self, regularization: Option<Regularization>);

    /// Runs one round over `data` and synchronizes `params` with every other worker.
    ///
    /// # Arguments
    /// * `ctx` - This worker's context.
    /// * `data` - This worker's partition.
    /// * `params` - This worker's replica of the parameters.
    /// * `num_global_samples` - The amount of records across every worker.
    async fn update_params(
        &mut self,
        ctx: &WorkerCtx,
        data: &Partition<LabeledPoint>,
        params: &mut ParameterVector,
        num_global_samples: usize,
    ) -> Result<()>;
}

/// Checks the conditions every engine needs before running a round.
pub(super) fn check_round(learning_rate: f32, num_global_samples: usize) -> Result<()> {
    if learning_rate == 0. || !learning_rate.is_finite() {
        return Err(MlErr::Precondition(
            "the learning rate must be a finite, non zero number",
        ));
    }

    if num_global_samples == 0 {
        return Err(MlErr::EmptyDataset("training set"));
    }

    Ok(())
}
