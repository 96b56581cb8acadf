//! Delivery capability
//!
//! A sink accepts one labeled record at a time. Network sinks queue and
//! batch internally; the console sink prints immediately.

use crate::error::DeliveryError;
use crate::labels::LabelSet;
use crate::metadata::Metadata;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::Write;

/// A single record on its way to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub labels: LabelSet,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub metadata: Metadata,
}

#[async_trait]
pub trait Sink: Send + Sync {
    async fn deliver(&self, entry: Entry) -> Result<(), DeliveryError>;
}

/// Dry-run sink: one `labels timestamp message metadata` line per record on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn format(entry: &Entry) -> String {
        format!(
            "{} {} {} {}",
            entry.labels,
            entry.timestamp.to_rfc3339(),
            entry.message,
            entry.metadata
        )
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    async fn deliver(&self, entry: Entry) -> Result<(), DeliveryError> {
        let line = Self::format(&entry);
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)?;
        Ok(())
    }
}

/// Adapts a closure into a sink
pub struct FnSink<F>(F);

impl<F> FnSink<F>
where
    F: Fn(Entry) -> Result<(), DeliveryError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Sink for FnSink<F>
where
    F: Fn(Entry) -> Result<(), DeliveryError> + Send + Sync,
{
    async fn deliver(&self, entry: Entry) -> Result<(), DeliveryError> {
        (self.0)(entry)
    }
}
