use std::sync::Arc;

use log::debug;
use tokio::sync::Barrier;

use crate::storage::{Result, StoreHandle};

/// Synchronizes parameter updates across multiple workers using a barrier.
///
/// Every round has two phases: all workers contribute, then exactly one of them (the
/// barrier leader) publishes. Nobody leaves the round before the publication is done.
#[derive(Debug, Clone)]
pub struct BarrierSync {
    barrier: Arc<Barrier>,
}

impl BarrierSync {
    /// Creates a new `BarrierSync` synchronizer.
    ///
    /// # Arguments
    /// * `barrier_size` - The amount of workers to wait on until merging.
    ///
    /// # Returns
    /// A new `BarrierSync` instance.
    pub fn new(barrier_size: usize) -> Self {
        Self {
            barrier: Arc::new(Barrier::new(barrier_size)),
        }
    }

    /// Pushes this worker's delta, waits for everyone else, merges once and pulls the
    /// resulting parameters into `params`.
    ///
    /// # Arguments
    /// * `handle` - The handle to the shared parameter store.
    /// * `delta` - This worker's additive update for the round.
    /// * `params` - Where to write the merged parameters.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `delta` or `params` aren't the size of the store. The worker
    /// still takes part in both barrier phases so the others are never left waiting.
    pub async fn step(&self, handle: &StoreHandle, delta: &[f32], params: &mut [f32]) -> Result<()> {
        let accumulated = handle.accumulate(delta).await;

        if self.barrier.wait().await.is_leader() {
            handle.apply().await;
            debug!(version = handle.version(); "merged parameter deltas");
        }

        self.barrier.wait().await;
        accumulated?;
        handle.pull_params(params).await
    }

    /// Runs the same two-phase protocol as `step` for arbitrary shared state.
    ///
    /// # Arguments
    /// * `contribute` - Run by every worker before the first barrier.
    /// * `publish` - Run by the barrier leader only, between both barriers.
    pub async fn rendezvous<C, P>(&self, contribute: C, publish: P)
    where
        C: FnOnce(),
        P: FnOnce(),
    {
        contribute();

        if self.barrier.wait().await.is_leader() {
            publish();
        }

        self.barrier.wait().await;
    }
}
