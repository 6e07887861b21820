pub mod attachment;
pub mod classifier;
pub mod criteria;
pub mod pipeline;
pub mod sender;
pub mod watch;
