//! Error types

use thiserror::Error;

/// Failure to hand one entry to a sink.
///
/// Emission loops swallow these; retry is the sink's concern.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery queue is full, entry dropped")]
    QueueFull,
    #[error("sink is closed")]
    Closed,
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown level: {0}")]
pub struct UnknownLevel(pub String);
