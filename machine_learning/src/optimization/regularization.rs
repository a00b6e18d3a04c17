use worker::ParameterVector;

use crate::{MlErr, Result};

/// A penalty on the size of the parameters, applied once per round by a single worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Regularization {
    /// Shrinks the penalized parameters towards zero by `lambda * learning_rate`.
    L2 { lambda: f32 },
}

impl Regularization {
    /// Creates a new L2 `Regularization`.
    ///
    /// # Returns
    /// A precondition error if `lambda` is negative or not finite.
    pub fn l2(lambda: f32) -> Result<Self> {
        if !lambda.is_finite() || lambda < 0. {
            return Err(MlErr::Precondition(
                "the regularization factor must be a finite, non negative number",
            ));
        }

        Ok(Self::L2 { lambda })
    }

    /// Creates a `Regularization` from the norm it penalizes.
    ///
    /// # Arguments
    /// * `norm` - Which norm to penalize, only 2 is supported.
    /// * `lambda` - The regularization factor.
    pub fn from_norm(norm: u32, lambda: f32) -> Result<Self> {
        match norm {
            1 => Err(MlErr::Unimplemented("L1 regularization")),
            2 => Self::l2(lambda),
            norm => Err(MlErr::InvalidRegularization { norm }),
        }
    }

    pub fn lambda(&self) -> f32 {
        match *self {
            Regularization::L2 { lambda } => lambda,
        }
    }

    /// Schedules the penalty updates for the first `current.len()` parameters.
    ///
    /// # Arguments
    /// * `params` - Where to schedule the updates.
    /// * `current` - The parameters the penalty is computed from.
    /// * `step` - The step size of this round.
    pub(crate) fn apply(&self, params: &mut ParameterVector, current: &[f32], step: f32) -> Result<()> {
        match *self {
            Regularization::L2 { lambda } => {
                for (i, w) in current.iter().enumerate() {
                    params.update(i, -w * step * lambda)?;
                }
            }
        }

        Ok(())
    }
}
