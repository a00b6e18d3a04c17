use std::{num::NonZeroUsize, ops::Range};

use super::Partition;

/// Splits `total` records among `nworkers` and returns the range owned by `worker_id`.
///
/// Ranges are contiguous, disjoint and cover `0..total`. Their sizes differ by at most one,
/// with the lower ids taking the remainder. An out of range `worker_id` owns nothing.
pub fn shard_range(total: usize, worker_id: usize, nworkers: NonZeroUsize) -> Range<usize> {
    let nworkers = nworkers.get();
    if worker_id >= nworkers {
        return total..total;
    }

    let base = total / nworkers;
    let rem = total % nworkers;

    let start = worker_id * base + worker_id.min(rem);
    let extra = usize::from(worker_id < rem);
    start..start + base + extra
}

/// Splits `records` into one `Partition` per worker following `shard_range`.
///
/// # Arguments
/// * `records` - The whole dataset, in load order.
/// * `nworkers` - The amount of partitions to make.
///
/// # Returns
/// The partitions ordered by worker id, some of them possibly empty.
pub fn scatter<T>(records: Vec<T>, nworkers: NonZeroUsize) -> Vec<Partition<T>> {
    let total = records.len();
    let mut records = records.into_iter();

    (0..nworkers.get())
        .map(|id| {
            let len = shard_range(total, id, nworkers).len();
            records.by_ref().take(len).collect()
        })
        .collect()
}
