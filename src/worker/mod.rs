pub mod command;
pub mod consumer;

pub use command::CommandProcessor;
pub use consumer::{BountyProcessor, BountyWorker};
