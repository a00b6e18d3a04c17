mod aggregator;
mod cluster;
mod context;
pub mod data;
pub mod error;
mod params;

pub use aggregator::{Aggregator, Retention};
pub use cluster::Cluster;
pub use context::{ROOT, WorkerCtx};
pub use data::{Partition, scatter, shard_range};
pub use error::{Result, WorkerErr};
pub use params::ParameterVector;
