use thiserror::Error;

/// Misuse of a queue. Timeouts are reported through return values instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
    #[error("queue is empty")]
    Empty,
}
