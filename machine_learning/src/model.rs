use std::{num::NonZeroUsize, sync::Arc};

use log::info;
use rayon::prelude::*;
use worker::{Aggregator, ParameterVector, Partition, Retention, WorkerCtx};

use crate::{
    MlErr, Result, dataset::LabeledPoint, gradient::Gradient,
    optimization::regularization::Regularization,
};

/// Computes the gradient contribution of a single record.
pub type GradientFn = Arc<dyn Fn(&LabeledPoint, &[f32]) -> Gradient + Send + Sync>;

/// Computes the error of a single record, averaged by `Model::avg_error`.
pub type ErrorFn = Arc<dyn Fn(&LabeledPoint, &[f32]) -> f32 + Send + Sync>;

/// Computes the predicted label of a single record.
pub type PredictFn = Arc<dyn Fn(&LabeledPoint, &[f32]) -> f32 + Send + Sync>;

/// A linear model whose behavior is given by its gradient, error and prediction functions.
///
/// The parameters are a replicated `ParameterVector`, so every worker holds its own `Model`
/// and they all agree on the parameters after every synchronization.
#[derive(Default)]
pub struct Model {
    params: Option<ParameterVector>,
    gradient_fn: Option<GradientFn>,
    error_fn: Option<ErrorFn>,
    predict_fn: Option<PredictFn>,
    regularization: Option<Regularization>,
    trained: bool,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collectively allocates `n` zero-initialized parameters, does nothing if `n` is zero.
    ///
    /// Every worker of the cluster must call it with the same `n`.
    pub fn set_num_param(&mut self, ctx: &WorkerCtx, n: usize) -> Result<()> {
        if let Some(n) = NonZeroUsize::new(n) {
            self.params = Some(ParameterVector::zeros(ctx, n)?);
        }

        Ok(())
    }

    pub fn set_gradient_fn<F>(&mut self, f: F)
    where
        F: Fn(&LabeledPoint, &[f32]) -> Gradient + Send + Sync + 'static,
    {
        self.gradient_fn = Some(Arc::new(f));
    }

    pub fn set_error_fn<F>(&mut self, f: F)
    where
        F: Fn(&LabeledPoint, &[f32]) -> f32 + Send + Sync + 'static,
    {
        self.error_fn = Some(Arc::new(f));
    }

    pub fn set_predict_fn<F>(&mut self, f: F)
    where
        F: Fn(&LabeledPoint, &[f32]) -> f32 + Send + Sync + 'static,
    {
        self.predict_fn = Some(Arc::new(f));
    }

    pub fn set_regularization(&mut self, regularization: Option<Regularization>) {
        self.regularization = regularization;
    }

    pub fn regularization(&self) -> Option<Regularization> {
        self.regularization
    }

    pub fn gradient_fn(&self) -> Result<&GradientFn> {
        self.gradient_fn
            .as_ref()
            .ok_or(MlErr::Precondition("the gradient function isn't set"))
    }

    pub fn error_fn(&self) -> Result<&ErrorFn> {
        self.error_fn
            .as_ref()
            .ok_or(MlErr::Precondition("the error function isn't set"))
    }

    pub fn predict_fn(&self) -> Result<&PredictFn> {
        self.predict_fn
            .as_ref()
            .ok_or(MlErr::Precondition("the predict function isn't set"))
    }

    /// The amount of parameters, zero before `set_num_param`.
    pub fn num_param(&self) -> usize {
        self.params.as_ref().map_or(0, ParameterVector::size)
    }

    /// The amount of feature weights, every parameter but the bias.
    pub fn num_features(&self) -> usize {
        self.num_param().saturating_sub(1)
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub(crate) fn set_trained(&mut self, trained: bool) {
        self.trained = trained;
    }

    pub fn params(&self) -> Result<&ParameterVector> {
        self.params
            .as_ref()
            .ok_or(MlErr::Precondition("the parameter vector isn't allocated"))
    }

    pub fn params_mut(&mut self) -> Result<&mut ParameterVector> {
        self.params
            .as_mut()
            .ok_or(MlErr::Precondition("the parameter vector isn't allocated"))
    }

    /// Overwrites the label of every local record with its prediction.
    pub fn predict(&self, records: &mut Partition<LabeledPoint>) -> Result<()> {
        let predict_fn = self.predict_fn()?;
        let params = self.params()?.as_slice();

        records
            .par_iter_mut()
            .for_each(|point| point.y = predict_fn(point, params));

        Ok(())
    }

    /// Averages the error function over the records of every worker.
    ///
    /// This is a collective operation, the result is the same on every worker.
    ///
    /// # Arguments
    /// * `ctx` - This worker's context.
    /// * `records` - This worker's share of the records.
    ///
    /// # Returns
    /// The mean error over the union of every worker's records.
    pub async fn avg_error(&self, ctx: &WorkerCtx, records: &Partition<LabeledPoint>) -> Result<f32> {
        let error_fn = self.error_fn()?;
        let params = self.params()?.as_slice();

        let local_sum: f64 = records
            .iter()
            .map(|point| f64::from(error_fn(point, params)))
            .sum();

        let aggregator = Aggregator::new(
            ctx,
            (0f64, 0usize),
            |acc: &mut (f64, usize), x: &(f64, usize)| {
                acc.0 += x.0;
                acc.1 += x.1;
            },
            Retention::ResetEachRound,
        )?;

        let (sum, count) = aggregator.reduce((local_sum, records.len())).await;
        if count == 0 {
            return Err(MlErr::EmptyDataset("evaluation set"));
        }

        Ok((sum / count as f64) as f32)
    }

    /// Logs the parameters, only once the model is trained.
    pub fn present_params(&self) {
        if !self.trained {
            return;
        }

        if let Some(params) = &self.params {
            info!("parameters: {:?}", params.as_slice());
        }
    }
}
