pub mod queues;
pub mod workers;

pub use queues::{ApalisScheduler, Queues};
pub use workers::JobContext;
