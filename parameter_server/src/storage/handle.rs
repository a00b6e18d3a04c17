use std::ops::Deref;

use tokio::task;

use super::{ParameterStore, Result};

/// The async interface to a `ParameterStore`.
///
/// It bridges the async runtime with the blocking CPU-bound implementation of the store,
/// so it must be used from a multi-threaded tokio runtime.
#[derive(Debug, Clone)]
pub struct StoreHandle(ParameterStore);

impl Deref for StoreHandle {
    type Target = ParameterStore;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl StoreHandle {
    /// Creates a new `StoreHandle`.
    ///
    /// # Arguments
    /// * `store` - The underlying parameter store.
    pub fn new(store: ParameterStore) -> Self {
        Self(store)
    }

    /// Async call to `ParameterStore::accumulate`.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `delta` isn't the size of the store.
    pub async fn accumulate(&self, delta: &[f32]) -> Result<()> {
        task::block_in_place(|| self.0.accumulate(delta))
    }

    /// Async call to `ParameterStore::apply`.
    pub async fn apply(&self) {
        task::block_in_place(|| self.0.apply());
    }

    /// Async call to `ParameterStore::pull_params`.
    ///
    /// # Returns
    /// A `SizeMismatchErr` if `out` isn't the size of the store.
    pub async fn pull_params(&self, out: &mut [f32]) -> Result<()> {
        task::block_in_place(|| self.0.pull_params(out))
    }
}
