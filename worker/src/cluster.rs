use std::{num::NonZeroUsize, time::Instant};

use log::{debug, info};
use tokio::task::JoinSet;

use crate::{
    WorkerCtx, WorkerErr,
    data::{Partition, scatter},
};

/// An in-process group of workers running the same job over their own inputs.
#[derive(Debug, Clone, Copy)]
pub struct Cluster {
    nworkers: NonZeroUsize,
}

impl Cluster {
    /// Creates a new `Cluster`.
    ///
    /// # Arguments
    /// * `nworkers` - The amount of workers, each one is a separate tokio task.
    pub fn new(nworkers: NonZeroUsize) -> Self {
        Self { nworkers }
    }

    pub fn nworkers(&self) -> usize {
        self.nworkers.get()
    }

    /// Splits `records` into one partition per worker of this cluster.
    pub fn scatter<T>(&self, records: Vec<T>) -> Vec<Partition<T>> {
        scatter(records, self.nworkers)
    }

    /// Runs `job` once per worker, each one with its own context and input.
    ///
    /// The jobs run concurrently on the current runtime, which must be multi-threaded. If a
    /// job fails the remaining ones are aborted, since they would wait on it forever at the
    /// next collective.
    ///
    /// # Arguments
    /// * `inputs` - One input per worker, ordered by worker id.
    /// * `job` - The program every worker runs.
    ///
    /// # Returns
    /// Every job's output ordered by worker id, or the first error.
    pub async fn run<I, F, Fut, T, E>(&self, inputs: Vec<I>, job: F) -> Result<Vec<T>, E>
    where
        I: Send + 'static,
        F: Fn(WorkerCtx, I) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<WorkerErr> + Send + 'static,
    {
        if inputs.len() != self.nworkers() {
            return Err(WorkerErr::InputCount {
                got: inputs.len(),
                expected: self.nworkers(),
            }
            .into());
        }

        let start = Instant::now();
        let mut tasks = JoinSet::new();

        for (ctx, input) in WorkerCtx::group(self.nworkers).into_iter().zip(inputs) {
            let id = ctx.id();
            let fut = job(ctx, input);
            tasks.spawn(async move { (id, fut.await) });
        }

        info!(workers = self.nworkers(); "cluster started");

        let mut outputs: Vec<Option<T>> = (0..self.nworkers()).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let (id, output) = match joined {
                Ok(res) => res,
                Err(e) => {
                    tasks.abort_all();
                    return Err(WorkerErr::Join(e.to_string()).into());
                }
            };

            match output {
                Ok(output) => {
                    debug!(worker_id = id; "worker finished");
                    outputs[id] = Some(output);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        info!(elapsed_secs = start.elapsed().as_secs_f64(); "cluster finished");
        Ok(outputs.into_iter().flatten().collect())
    }
}
