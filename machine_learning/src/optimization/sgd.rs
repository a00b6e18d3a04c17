use log::trace;
use worker::{ParameterVector, Partition, WorkerCtx};

use super::{GradientDescent, Regularization, gradient_descent::check_round};
use crate::{MlErr, Result, dataset::LabeledPoint, model::GradientFn};

/// Stochastic gradient descent.
///
/// Each worker walks its records in order, stepping its local copy of the parameters after
/// every record. The steps are weighted by the worker's share of the records before being
/// merged, so bigger partitions pull harder.
pub struct Sgd {
    gradient_fn: GradientFn,
    learning_rate: f32,
    regularization: Option<Regularization>,
}

impl GradientDescent for Sgd {
    fn with_gradient(gradient_fn: GradientFn, learning_rate: f32) -> Self {
        Self {
            gradient_fn,
            learning_rate,
            regularization: None,
        }
    }

    fn set_regularization(&mut self, regularization: Option<Regularization>) {
        self.regularization = regularization;
    }

    async fn update_params(
        &mut self,
        ctx: &WorkerCtx,
        data: &Partition<LabeledPoint>,
        params: &mut ParameterVector,
        num_global_samples: usize,
    ) -> Result<()> {
        let lr = self.learning_rate;
        check_round(lr, num_global_samples)?;

        let mut current = params.get_all();

        if let Some(regularization) = self.regularization.filter(|_| ctx.is_root()) {
            regularization.apply(params, &current, lr)?;
        }

        let ratio = data.len() as f32 / num_global_samples as f32;

        data.try_for_each(|point| {
            let grad = (self.gradient_fn)(point, &current);

            for (i, g) in grad.iter() {
                let delta = g * lr;
                params.update(i, delta * ratio)?;
                current[i] += delta;
            }

            Ok::<_, MlErr>(())
        })?;

        trace!(worker_id = ctx.id(), records = data.len(); "local sgd pass done");
        params.sync().await?;
        Ok(())
    }
}
