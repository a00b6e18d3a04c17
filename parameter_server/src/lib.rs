//! Shared storage for the trainable parameter vector.
//!
//! Parameters live in a sharded [`ParameterStore`]. Workers push additive deltas into it,
//! a single leader merges them once every worker has contributed, and everyone pulls the
//! same merged vector back. [`BarrierSync`] drives that rendezvous.

pub mod storage;
pub mod synchronization;

pub use storage::{ParameterStore, Result, SizeMismatchErr, StoreHandle};
pub use synchronization::BarrierSync;
