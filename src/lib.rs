pub mod blocking_queue;
pub use blocking_queue::BoundedBlockingQueue;

pub mod countdown_latch;
pub use countdown_latch::CountdownLatch;

pub mod error;
pub use error::QueueError;

/// A specialized `Result` type for queue operations that can be misused.
///
/// Timeouts never show up here; `push` and `pop` report them through
/// `bool` and `Option`.
pub type Result<T> = std::result::Result<T, QueueError>;
