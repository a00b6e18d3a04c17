use worker::{ParameterVector, Partition, WorkerCtx};

use super::{GradientDescent, Regularization, gradient_descent::check_round};
use crate::{Result, dataset::LabeledPoint, model::GradientFn};

/// Full gradient descent with a decaying step.
///
/// Every record's gradient is taken against the parameters the round started with, and the
/// step for round `t` is `learning_rate / (t + 1)`. The regularization leaves the bias,
/// the last parameter, untouched.
pub struct Fgd {
    gradient_fn: GradientFn,
    learning_rate: f32,
    regularization: Option<Regularization>,
    rounds: usize,
}

impl Fgd {
    /// The step size of the next round.
    pub fn step(&self) -> f32 {
        self.learning_rate / (self.rounds + 1) as f32
    }
}

impl GradientDescent for Fgd {
    fn with_gradient(gradient_fn: GradientFn, learning_rate: f32) -> Self {
        Self {
            gradient_fn,
            learning_rate,
            regularization: None,
            rounds: 0,
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
        check_round(self.learning_rate, num_global_samples)?;

        let eta = self.step();
        let frozen = params.get_all();

        if let Some(regularization) = self.regularization.filter(|_| ctx.is_root()) {
            let weights = frozen.split_last().map_or(&[][..], |(_, w)| w);
            regularization.apply(params, weights, eta)?;
        }

        let scale = eta / num_global_samples as f32;

        data.try_for_each(|point| {
            (self.gradient_fn)(point, &frozen)
                .iter()
                .try_for_each(|(i, g)| params.update(i, g * scale))
        })?;

        params.sync().await?;
        self.rounds += 1;
        Ok(())
    }
}
