mod partition;
mod shard;

pub use partition::Partition;
pub use shard::{scatter, shard_range};
