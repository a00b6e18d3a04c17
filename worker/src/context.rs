use std::{
    any::Any,
    collections::HashMap,
    fmt,
    num::NonZeroUsize,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{Result, WorkerErr};

/// The id of the worker that performs the once-per-cluster duties (logging, regularization).
pub const ROOT: usize = 0;

struct Slot {
    object: Arc<dyn Any + Send + Sync>,
    unclaimed: usize,
}

/// Hands out the objects shared by every worker of a cluster.
///
/// Every worker runs the same program, so the `n`-th collective creation on each of them
/// refers to the same object: the first worker to reach slot `n` creates it and the rest
/// pick it up. A slot is forgotten once all the workers have claimed it.
struct Registry {
    nworkers: usize,
    slots: Mutex<HashMap<usize, Slot>>,
}

impl Registry {
    fn new(nworkers: usize) -> Self {
        Self {
            nworkers,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn claim<T, F>(&self, slot: usize, create: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let object = {
            let mut slots = self.slots.lock();
            let entry = slots.entry(slot).or_insert_with(|| Slot {
                object: Arc::new(create()),
                unclaimed: self.nworkers,
            });

            entry.unclaimed -= 1;
            let object = Arc::clone(&entry.object);

            if entry.unclaimed == 0 {
                slots.remove(&slot);
            }

            object
        };

        object
            .downcast::<T>()
            .map_err(|_| WorkerErr::CollectiveMismatch { slot })
    }
}

/// The identity of a single worker inside a cluster and its door to the collectives.
pub struct WorkerCtx {
    id: usize,
    nworkers: NonZeroUsize,
    registry: Arc<Registry>,
    next_slot: AtomicUsize,
}

impl fmt::Debug for WorkerCtx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerCtx")
            .field("id", &self.id)
            .field("nworkers", &self.nworkers)
            .field("next_slot", &self.next_slot.load(Ordering::Relaxed))
            .finish()
    }
}

impl WorkerCtx {
    /// Creates the contexts of a whole group of workers sharing the same collectives.
    ///
    /// # Arguments
    /// * `nworkers` - The size of the group.
    ///
    /// # Returns
    /// One context per worker, ordered by id.
    pub fn group(nworkers: NonZeroUsize) -> Vec<WorkerCtx> {
        let registry = Arc::new(Registry::new(nworkers.get()));

        (0..nworkers.get())
            .map(|id| WorkerCtx {
                id,
                nworkers,
                registry: Arc::clone(&registry),
                next_slot: AtomicUsize::new(0),
            })
            .collect()
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn nworkers(&self) -> usize {
        self.nworkers.get()
    }

    /// Whether this worker is the designated one for once-per-cluster duties.
    pub fn is_root(&self) -> bool {
        self.id == ROOT
    }

    /// Resolves the next collective object, creating it if this worker is the first one
    /// to get here.
    ///
    /// # Arguments
    /// * `create` - Builds the shared object, only called once per cluster.
    ///
    /// # Returns
    /// The shared object or a `CollectiveMismatch` if another worker created a different
    /// type in this slot.
    pub(crate) fn collective<T, F>(&self, create: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let slot = self.next_slot.fetch_add(1, Ordering::Relaxed);
        self.registry.claim(slot, create)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(n: usize) -> Vec<WorkerCtx> {
        WorkerCtx::group(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn test_group_ids() {
        let ctxs = group(3);

        let ids: Vec<_> = ctxs.iter().map(WorkerCtx::id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(ctxs[0].is_root());
        assert!(!ctxs[2].is_root());
        assert!(ctxs.iter().all(|ctx| ctx.nworkers() == 3));
    }

    #[test]
    fn test_same_slot_resolves_to_same_object() {
        let ctxs = group(2);

        let a = ctxs[0].collective(|| Mutex::new(1)).unwrap();
        let b = ctxs[1].collective(|| Mutex::new(2)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b.lock(), 1);

        let c = ctxs[1].collective(|| 7u32).unwrap();
        let d = ctxs[0].collective(|| 8u32).unwrap();
        assert_eq!((*c, *d), (7, 7));
    }

    #[test]
    fn test_slots_are_released_after_every_claim() {
        let ctxs = group(2);

        ctxs[0].collective(|| 1u8).unwrap();
        assert_eq!(ctxs[0].registry.slots.lock().len(), 1);

        ctxs[1].collective(|| 1u8).unwrap();
        assert!(ctxs[0].registry.slots.lock().is_empty());
    }

    #[test]
    fn test_type_mismatch() {
        let ctxs = group(2);

        ctxs[0].collective(|| 1u8).unwrap();
        let err = ctxs[1].collective(|| String::from("x")).unwrap_err();
        assert!(matches!(err, WorkerErr::CollectiveMismatch { slot: 0 }));
    }
}
