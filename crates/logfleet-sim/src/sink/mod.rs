//! Network sinks
//!
//! [`LokiSink`] and [`OtlpSink`] share one batching worker and differ only
//! in their wire protocol.

pub mod batch;
pub mod loki;
pub mod otlp;

pub use batch::{BatchConfig, BatchingSink, PushProtocol, PushStats};
pub use loki::{LokiPush, LokiSink};
pub use otlp::{OtlpLogs, OtlpSink};
