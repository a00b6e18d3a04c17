use parking_lot::{Mutex, RwLock};

use crate::storage::{Result, SizeMismatchErr};

/// A contiguous slice of the parameter vector.
///
/// Workers add their deltas into `pending` concurrently; `apply` folds the pending sum
/// into `params` and clears it. Readers never see `params` halfway through an `apply`.
#[derive(Debug)]
pub struct ParameterShard {
    nparams: usize,
    pending: Mutex<Box<[f32]>>,
    params: RwLock<Box<[f32]>>,
}

impl ParameterShard {
    /// Creates a new `ParameterShard`.
    ///
    /// # Arguments
    /// * `params` - The initial state of the parameters.
    ///
    /// # Returns
    /// A new `ParameterShard` instance.
    pub fn new(params: Vec<f32>) -> Self {
        let nparams = params.len();

        Self {
            nparams,
            pending: Mutex::new(vec![0.; nparams].into_boxed_slice()),
            params: RwLock::new(params.into_boxed_slice()),
        }
    }

    /// Adds `delta` into the pending buffer.
    ///
    /// # Arguments
    /// * `delta` - The additive update for this shard.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `delta` isn't the same size as this shard.
    pub fn accumulate(&self, delta: &[f32]) -> Result<()> {
        self.check_len(delta.len())?;

        self.pending
            .lock()
            .iter_mut()
            .zip(delta)
            .for_each(|(acc, d)| *acc += d);

        Ok(())
    }

    /// Folds the pending deltas into the parameters and resets the pending buffer.
    pub fn apply(&self) {
        let mut params = self.params.write();
        let mut pending = self.pending.lock();

        params
            .iter_mut()
            .zip(pending.iter())
            .for_each(|(p, d)| *p += d);

        pending.fill(0.);
    }

    /// Copies the shard's parameters into `out`.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `out` isn't the same size as this shard.
    pub fn pull_params(&self, out: &mut [f32]) -> Result<()> {
        self.check_len(out.len())?;
        out.copy_from_slice(&self.params.read());
        Ok(())
    }

    fn check_len(&self, got: usize) -> Result<()> {
        if got != self.nparams {
            return Err(SizeMismatchErr {
                got,
                expected: self.nparams,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_invisible_until_applied() {
        let shard = ParameterShard::new(vec![1.; 3]);

        shard.accumulate(&[1.0, 2.0, 3.0]).unwrap();
        shard.accumulate(&[0.5, 0.5, 0.5]).unwrap();

        let mut out = [0.; 3];
        shard.pull_params(&mut out).unwrap();
        assert_eq!(out, [1., 1., 1.]);

        shard.apply();
        shard.pull_params(&mut out).unwrap();
        assert_eq!(out, [2.5, 3.5, 4.5]);
    }

    #[test]
    fn test_apply_clears_pending() {
        let shard = ParameterShard::new(vec![0.]);

        shard.accumulate(&[10.]).unwrap();
        shard.apply();
        shard.apply();

        let mut out = [0.];
        shard.pull_params(&mut out).unwrap();
        assert_eq!(out, [10.]);
    }

    #[test]
    fn test_rejects_wrong_lengths() {
        let shard = ParameterShard::new(vec![0.; 2]);

        let err = shard.accumulate(&[1.]).unwrap_err();
        assert_eq!(err, SizeMismatchErr { got: 1, expected: 2 });

        let mut out = [0.; 3];
        assert!(shard.pull_params(&mut out).is_err());
    }
}
