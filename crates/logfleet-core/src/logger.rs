//! Per-pod logger binding a base label set to a sink

use crate::error::DeliveryError;
use crate::labels::{LEVEL, LabelSet};
use crate::level::Level;
use crate::metadata::Metadata;
use crate::sink::{Entry, Sink};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Holds the base label set plus one pre-merged set per level.
#[derive(Clone)]
pub struct AppLogger {
    labels: LabelSet,
    levels: [LabelSet; 4],
    sink: Arc<dyn Sink>,
}

impl AppLogger {
    pub fn new(labels: LabelSet, sink: Arc<dyn Sink>) -> Self {
        let levels =
            Level::ALL.map(|level| labels.merge(&LabelSet::new().with(LEVEL, level.as_str())));
        Self {
            labels,
            levels,
            sink,
        }
    }

    /// Stream labels shared by every record, before any `level` is added
    pub fn base_labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Labels for a record at `level`; `None` falls back to the base set.
    pub fn labels_for(&self, level: Option<Level>) -> &LabelSet {
        match level {
            Some(level) => &self.levels[level.index()],
            None => &self.labels,
        }
    }

    /// Same as [`labels_for`](Self::labels_for) for a raw level string.
    /// Unrecognized names get the base set, with no `level` label.
    pub fn labels_for_name(&self, level: &str) -> &LabelSet {
        self.labels_for(level.parse().ok())
    }

    pub async fn log(
        &self,
        level: Option<Level>,
        timestamp: DateTime<Utc>,
        message: String,
        metadata: Metadata,
    ) -> Result<(), DeliveryError> {
        let entry = Entry {
            labels: self.labels_for(level).clone(),
            timestamp,
            message,
            metadata,
        };
        self.sink.deliver(entry).await
    }
}
