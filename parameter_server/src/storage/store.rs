use std::{
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use rayon::prelude::*;

use crate::storage::{ParameterShard, Result, SizeMismatchErr};

/// Partitions the parameter vector in shards and leverages parallelization to merge and
/// read them as fast as possible.
///
/// Cloning is cheap, every clone refers to the same shards.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    nparams: usize,
    shards: Arc<[ParameterShard]>,
    shard_size: NonZeroUsize,
    version: Arc<AtomicU64>,
}

impl ParameterStore {
    /// Creates a new `ParameterStore` holding `params`.
    ///
    /// # Arguments
    /// * `params` - The initial state of the parameters.
    /// * `shard_size` - The maximum amount of parameters per shard.
    ///
    /// # Returns
    /// A new `ParameterStore` instance.
    pub fn new(params: Vec<f32>, shard_size: NonZeroUsize) -> Self {
        let nparams = params.len();
        let shards: Vec<_> = params
            .chunks(shard_size.get())
            .map(|chunk| ParameterShard::new(chunk.to_vec()))
            .collect();

        Self {
            nparams,
            shards: Arc::from(shards),
            shard_size,
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a new zero-initialized `ParameterStore`.
    ///
    /// # Arguments
    /// * `nparams` - The amount of parameters.
    /// * `shard_size` - The maximum amount of parameters per shard.
    pub fn zeros(nparams: usize, shard_size: NonZeroUsize) -> Self {
        Self::new(vec![0.; nparams], shard_size)
    }

    /// Returns the amount of parameters in the storage.
    pub fn len(&self) -> usize {
        self.nparams
    }

    pub fn is_empty(&self) -> bool {
        self.nparams == 0
    }

    /// Returns how many times the pending deltas have been merged.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Adds a dense delta into the pending buffers of every shard.
    ///
    /// # Arguments
    /// * `delta` - A flat slice with one additive update per parameter.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `delta` doesn't cover exactly every parameter.
    pub(super) fn accumulate(&self, delta: &[f32]) -> Result<()> {
        self.check_len(delta.len())?;

        self.shards
            .par_iter()
            .zip(delta.par_chunks(self.shard_size.get()))
            .try_for_each(|(shard, delta_slice)| shard.accumulate(delta_slice))
    }

    /// Merges the pending deltas of every shard into the parameters.
    pub(super) fn apply(&self) {
        self.shards.par_iter().for_each(ParameterShard::apply);
        self.version.fetch_add(1, Ordering::AcqRel);
    }

    /// Gathers all the sharded parameters into `out`.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `out` isn't the size of the store.
    pub(super) fn pull_params(&self, out: &mut [f32]) -> Result<()> {
        self.check_len(out.len())?;

        self.shards
            .par_iter()
            .zip(out.par_chunks_mut(self.shard_size.get()))
            .try_for_each(|(shard, out_slice)| shard.pull_params(out_slice))
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
