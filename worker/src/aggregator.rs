use std::{ops::AddAssign, sync::Arc};

use parameter_server::BarrierSync;
use parking_lot::{Mutex, RwLock};

use crate::{Result, WorkerCtx};

/// What happens to the published value when a new reduction comes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// The published value keeps absorbing every reduction, e.g. a sample count taken once.
    Persistent,
    /// Each reduction publishes only that round's contributions, e.g. a per-round loss.
    ResetEachRound,
}

type CombineFn<T> = Box<dyn Fn(&mut T, &T) + Send + Sync>;

struct Shared<T> {
    init: T,
    combine: CombineFn<T>,
    retention: Retention,
    pending: Mutex<T>,
    value: RwLock<T>,
    sync: BarrierSync,
}

impl<T: Clone> Shared<T> {
    fn publish(&self) {
        let mut pending = self.pending.lock();
        let mut value = self.value.write();

        match self.retention {
            Retention::Persistent => (self.combine)(&mut value, &pending),
            Retention::ResetEachRound => *value = pending.clone(),
        }

        *pending = self.init.clone();
    }
}

/// The global reduction primitive.
///
/// Every worker of the cluster holds a handle to the same aggregator. A `reduce` call blocks
/// until every worker has contributed and returns the merged value, which is the same on
/// every worker. The combine function must be commutative and associative.
pub struct Aggregator<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Aggregator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Collectively creates a new `Aggregator`.
    ///
    /// # Arguments
    /// * `ctx` - This worker's context.
    /// * `init` - The identity of `combine`, also the value before any reduction.
    /// * `combine` - Merges the right value into the left one.
    /// * `retention` - Whether published values accumulate or reset between reductions.
    ///
    /// # Returns
    /// A handle to the aggregator shared by every worker.
    pub fn new<C>(ctx: &WorkerCtx, init: T, combine: C, retention: Retention) -> Result<Self>
    where
        C: Fn(&mut T, &T) + Send + Sync + 'static,
    {
        let nworkers = ctx.nworkers();
        let shared = ctx.collective(move || Shared {
            pending: Mutex::new(init.clone()),
            value: RwLock::new(init.clone()),
            init,
            combine: Box::new(combine),
            retention,
            sync: BarrierSync::new(nworkers),
        })?;

        Ok(Self { shared })
    }

    /// Contributes `local` and waits for every other worker to contribute as well.
    ///
    /// # Returns
    /// The published value after this reduction.
    pub async fn reduce(&self, local: T) -> T {
        let shared = &*self.shared;

        shared
            .sync
            .rendezvous(
                || (shared.combine)(&mut shared.pending.lock(), &local),
                || shared.publish(),
            )
            .await;

        shared.value.read().clone()
    }

    /// Returns the last published value without synchronizing.
    pub fn value(&self) -> T {
        self.shared.value.read().clone()
    }
}

impl<T> Aggregator<T>
where
    T: Copy + Default + AddAssign + Send + Sync + 'static,
{
    /// Collectively creates a summing `Aggregator` starting at zero.
    pub fn sum(ctx: &WorkerCtx, retention: Retention) -> Result<Self> {
        Self::new(ctx, T::default(), |acc, x| *acc += *x, retention)
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use tokio::task::JoinSet;

    use super::*;

    async fn run_group<F, Fut, T>(n: usize, job: F) -> Vec<T>
    where
        F: Fn(WorkerCtx) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut tasks = JoinSet::new();
        for ctx in WorkerCtx::group(NonZeroUsize::new(n).unwrap()) {
            tasks.spawn(job(ctx));
        }

        tasks.join_all().await
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reduce_is_visible_to_everyone() {
        let results = run_group(4, |ctx| async move {
            let agg = Aggregator::<usize>::sum(&ctx, Retention::Persistent).unwrap();
            agg.reduce(ctx.id() + 1).await
        })
        .await;

        assert_eq!(results, vec![10; 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_persistent_values_accumulate() {
        let results = run_group(3, |ctx| async move {
            let agg = Aggregator::<f32>::sum(&ctx, Retention::Persistent).unwrap();
            let first = agg.reduce(1.).await;
            let second = agg.reduce(2.).await;
            (first, second, agg.value())
        })
        .await;

        assert!(results.iter().all(|&r| r == (3., 9., 9.)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reset_each_round() {
        let results = run_group(3, |ctx| async move {
            let agg = Aggregator::<f32>::sum(&ctx, Retention::ResetEachRound).unwrap();
            let first = agg.reduce(1.).await;
            let second = agg.reduce(2.).await;
            (first, second)
        })
        .await;

        assert!(results.iter().all(|&r| r == (3., 6.)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_custom_combine() {
        let results = run_group(3, |ctx| async move {
            let agg = Aggregator::new(
                &ctx,
                f32::MIN,
                |acc: &mut f32, x: &f32| *acc = acc.max(*x),
                Retention::ResetEachRound,
            )
            .unwrap();
            agg.reduce(ctx.id() as f32 * 2.).await
        })
        .await;

        assert_eq!(results, vec![4.; 3]);
    }
}
