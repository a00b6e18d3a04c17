use std::{num::NonZeroUsize, sync::Arc};

use log::trace;
use parameter_server::{BarrierSync, ParameterStore, SizeMismatchErr, StoreHandle};

use crate::{Result, WorkerCtx, WorkerErr};

const SHARD_SIZE: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

struct SharedParams {
    handle: StoreHandle,
    sync: BarrierSync,
}

/// A worker's replica of the shared parameter vector.
///
/// Reads come from the local snapshot, which is identical on every worker after each
/// `sync`. Updates are additive and stay local until the next `sync`, where every worker's
/// deltas are merged at once.
pub struct ParameterVector {
    shared: Arc<SharedParams>,
    root: bool,
    snapshot: Vec<f32>,
    pending: Vec<f32>,
}

impl ParameterVector {
    /// Collectively allocates a zero-initialized parameter vector.
    ///
    /// # Arguments
    /// * `ctx` - This worker's context.
    /// * `nparams` - The amount of parameters.
    ///
    /// # Returns
    /// This worker's replica of the shared vector.
    pub fn zeros(ctx: &WorkerCtx, nparams: NonZeroUsize) -> Result<Self> {
        let nworkers = ctx.nworkers();
        let shared = ctx.collective(|| SharedParams {
            handle: StoreHandle::new(ParameterStore::zeros(nparams.get(), SHARD_SIZE)),
            sync: BarrierSync::new(nworkers),
        })?;

        let len = shared.handle.len();
        if len != nparams.get() {
            return Err(SizeMismatchErr {
                got: nparams.get(),
                expected: len,
            }
            .into());
        }

        Ok(Self {
            shared,
            root: ctx.is_root(),
            snapshot: vec![0.; len],
            pending: vec![0.; len],
        })
    }

    pub fn size(&self) -> usize {
        self.snapshot.len()
    }

    /// Returns an owned copy of the parameters as of the last synchronization.
    pub fn get_all(&self) -> Vec<f32> {
        self.snapshot.clone()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.snapshot
    }

    /// Returns the parameter at `index` as of the last synchronization.
    pub fn param_at(&self, index: usize) -> Result<f32> {
        self.snapshot
            .get(index)
            .copied()
            .ok_or(WorkerErr::IndexOutOfBounds {
                index,
                len: self.size(),
            })
    }

    /// Schedules `delta` to be added to the parameter at `index` on the next `sync`.
    pub fn update(&mut self, index: usize, delta: f32) -> Result<()> {
        let len = self.size();
        let slot = self
            .pending
            .get_mut(index)
            .ok_or(WorkerErr::IndexOutOfBounds { index, len })?;

        *slot += delta;
        Ok(())
    }

    /// Merges every worker's pending updates and refreshes the local snapshot.
    ///
    /// Every worker must call it, it only returns once all of them have contributed.
    pub async fn sync(&mut self) -> Result<()> {
        let Self {
            shared,
            snapshot,
            pending,
            ..
        } = self;

        shared.sync.step(&shared.handle, pending, snapshot).await?;
        pending.fill(0.);

        trace!(version = shared.handle.version(); "parameters synchronized");
        Ok(())
    }

    /// Collectively overwrites the parameters with the root worker's `values`.
    ///
    /// Pending updates are discarded on every worker.
    pub async fn assign(&mut self, values: &[f32]) -> Result<()> {
        if values.len() != self.size() {
            return Err(SizeMismatchErr {
                got: values.len(),
                expected: self.size(),
            }
            .into());
        }

        if self.root {
            self.pending
                .iter_mut()
                .zip(values.iter().zip(&self.snapshot))
                .for_each(|(p, (v, s))| *p = v - s);
        } else {
            self.pending.fill(0.);
        }

        self.sync().await
    }
}
