use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use log::info;
use worker::{Aggregator, Partition, Retention, WorkerCtx};

use super::{EarlyStopping, StopReason};
use crate::{
    MlErr, Result,
    dataset::LabeledPoint,
    model::{ErrorFn, Model},
    optimization::{GradientDescent, Regularization},
};

/// What happened during a training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    /// The amount of rounds that actually ran.
    pub rounds: usize,
    /// The mean round loss over the training set, only filled when reporting per round.
    pub losses: Vec<f32>,
    /// The test error after each round, only filled by `train_test`.
    pub test_errors: Vec<f32>,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Trains a linear `Model` by gradient descent over the partitions of a cluster.
///
/// Every worker runs the same calls on its own `Regression`, all of them collective.
pub struct Regression {
    model: Model,
    round_loss: Option<ErrorFn>,
    report_per_round: bool,
    early_stopping: EarlyStopping,
}

impl Regression {
    pub fn new(model: Model) -> Self {
        Self {
            model,
            round_loss: None,
            report_per_round: false,
            early_stopping: EarlyStopping::default(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Enables L2 regularization with factor `lambda`.
    pub fn set_regularization_factor(&mut self, lambda: f32) -> Result<()> {
        self.model.set_regularization(Some(Regularization::l2(lambda)?));
        Ok(())
    }

    /// Enables the regularization of the given norm.
    pub fn set_regularization(&mut self, norm: u32, lambda: f32) -> Result<()> {
        self.model
            .set_regularization(Some(Regularization::from_norm(norm, lambda)?));
        Ok(())
    }

    /// Sets the per record loss reported each round, the error function is used otherwise.
    pub fn set_round_loss<F>(&mut self, f: F)
    where
        F: Fn(&LabeledPoint, &[f32]) -> f32 + Send + Sync + 'static,
    {
        self.round_loss = Some(Arc::new(f));
    }

    pub fn set_report_per_round(&mut self, report_per_round: bool) {
        self.report_per_round = report_per_round;
    }

    pub fn set_early_stopping(&mut self, early_stopping: EarlyStopping) {
        self.early_stopping = early_stopping;
    }

    /// Trains the model for `iterations` rounds.
    ///
    /// # Arguments
    /// * `ctx` - This worker's context.
    /// * `data` - This worker's share of the training set.
    /// * `iterations` - The amount of rounds.
    /// * `learning_rate` - The step size handed to the gradient descent engine `G`.
    ///
    /// # Returns
    /// A report of the run, or the first precondition that didn't hold.
    pub async fn train<G: GradientDescent>(
        &mut self,
        ctx: &WorkerCtx,
        data: &Partition<LabeledPoint>,
        iterations: usize,
        learning_rate: f32,
    ) -> Result<TrainingReport> {
        self.run::<G>(ctx, data, None, iterations, learning_rate)
            .await
    }

    /// Trains the model like `train`, measuring the error over `test` after every round and
    /// stopping early as soon as it stops improving.
    ///
    /// # Arguments
    /// * `ctx` - This worker's context.
    /// * `data` - This worker's share of the training set.
    /// * `test` - This worker's share of the test set.
    /// * `iterations` - The maximum amount of rounds.
    /// * `learning_rate` - The step size handed to the gradient descent engine `G`.
    pub async fn train_test<G: GradientDescent>(
        &mut self,
        ctx: &WorkerCtx,
        data: &Partition<LabeledPoint>,
        test: &Partition<LabeledPoint>,
        iterations: usize,
        learning_rate: f32,
    ) -> Result<TrainingReport> {
        self.run::<G>(ctx, data, Some(test), iterations, learning_rate)
            .await
    }

    async fn run<G: GradientDescent>(
        &mut self,
        ctx: &WorkerCtx,
        data: &Partition<LabeledPoint>,
        test: Option<&Partition<LabeledPoint>>,
        iterations: usize,
        learning_rate: f32,
    ) -> Result<TrainingReport> {
        self.check_preconditions(data, test, learning_rate)?;

        let start = Instant::now();
        let root = ctx.is_root();
        let gradient_fn = Arc::clone(self.model.gradient_fn()?);
        let round_loss = match &self.round_loss {
            Some(f) => Arc::clone(f),
            None => Arc::clone(self.model.error_fn()?),
        };

        let num_samples_agg = Aggregator::<usize>::sum(ctx, Retention::Persistent)?;
        let loss_agg = Aggregator::<f64>::sum(ctx, Retention::ResetEachRound)?;

        let num_samples = num_samples_agg.reduce(data.len()).await;
        if root {
            info!(samples = num_samples; "training set size");
        }
        if num_samples == 0 {
            return Err(MlErr::EmptyDataset("training set"));
        }

        let mut engine = G::with_gradient(gradient_fn, learning_rate);
        engine.set_regularization(self.model.regularization());

        let restore = test.is_some() && self.early_stopping.restore_previous;
        let mut report = TrainingReport::default();
        let mut past_error = 0.;

        for round in 0..iterations {
            let previous = restore.then(|| self.model.params().map(|p| p.get_all()));
            let previous = previous.transpose()?;

            engine
                .update_params(ctx, data, self.model.params_mut()?, num_samples)
                .await?;
            report.rounds = round + 1;

            if self.report_per_round {
                let params = self.model.params()?.as_slice();
                let local: f64 = data
                    .iter()
                    .map(|point| f64::from(round_loss(point, params)))
                    .sum();

                let loss = (loss_agg.reduce(local).await / num_samples as f64) as f32;
                if root {
                    info!(round = round + 1, loss = loss; "round finished");
                }
                report.losses.push(loss);
            }

            let Some(test) = test else {
                continue;
            };

            let error = self.model.avg_error(ctx, test).await?;
            report.test_errors.push(error);
            if self.report_per_round && root {
                info!(round = round + 1, error = error; "test error");
            }

            if let Some(reason) = self.early_stopping.check(round, error, past_error) {
                if let (StopReason::ErrorIncreased, Some(previous)) = (reason, &previous) {
                    self.model.params_mut()?.assign(previous).await?;
                }

                if root {
                    info!(round = round + 1; "early stopping invoked ({reason:?}), training is completed");
                }
                report.stop_reason = reason;
                break;
            }

            past_error = error;
        }

        self.model.set_trained(true);
        report.elapsed = start.elapsed();

        if root {
            info!(rounds = report.rounds, elapsed_secs = report.elapsed.as_secs_f64(); "training finished");
        }

        Ok(report)
    }

    fn check_preconditions(
        &self,
        data: &Partition<LabeledPoint>,
        test: Option<&Partition<LabeledPoint>>,
        learning_rate: f32,
    ) -> Result<()> {
        if self.model.num_param() == 0 {
            return Err(MlErr::Precondition("the number of parameters is 0"));
        }

        self.model.gradient_fn()?;
        self.model.error_fn()?;

        if learning_rate == 0. || !learning_rate.is_finite() {
            return Err(MlErr::Precondition(
                "the learning rate must be a finite, non zero number",
            ));
        }

        let num_features = self.model.num_features();
        let fits = |point: &LabeledPoint| {
            if point.dim() > num_features {
                return Err(MlErr::SizeMismatch {
                    what: "record features",
                    got: point.dim(),
                    expected: num_features,
                });
            }

            Ok(())
        };

        data.try_for_each(fits)?;
        if let Some(test) = test {
            test.try_for_each(fits)?;
        }

        Ok(())
    }
}
