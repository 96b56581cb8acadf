//! Emission loops
//!
//! One loop per (pod, stream). Each iteration renders a line, hands it to the
//! pod's logger and waits for the next tick. Delivery failures are counted
//! and dropped; the loop only ends when its cancellation token fires.

use crate::fleet;
use chrono::{DateTime, Utc};
use logfleet_core::metadata::{Metadata, TraceAffinity};
use logfleet_core::{AppLogger, Line};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Delay between two iterations of a loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    /// Uniform in `[0, bound)`; a zero bound means back-to-back
    Jitter(Duration),
    /// Exactly this long every time
    Every(Duration),
}

impl Pacing {
    pub const fn jitter_ms(ms: u64) -> Self {
        Pacing::Jitter(Duration::from_millis(ms))
    }

    pub const fn every_ms(ms: u64) -> Self {
        Pacing::Every(Duration::from_millis(ms))
    }

    pub fn next_delay<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            Pacing::Jitter(bound) if bound.is_zero() => Duration::ZERO,
            Pacing::Jitter(bound) => {
                let bound_ms = u64::try_from(bound.as_millis()).unwrap_or(u64::MAX).max(1);
                Duration::from_millis(rng.random_range(0..bound_ms))
            }
            Pacing::Every(period) => period,
        }
    }
}

/// Where each iteration's structured metadata comes from
#[derive(Debug, Clone)]
pub enum MetadataSource {
    /// The pod's own bundle, repeated on every line
    Fixed(Metadata),
    /// A new bundle per line, as if each line came from a different replica
    Fresh {
        service: String,
        affinity: TraceAffinity,
    },
}

impl MetadataSource {
    pub fn fresh(service: impl Into<String>) -> Self {
        MetadataSource::Fresh {
            service: service.into(),
            affinity: TraceAffinity::new(),
        }
    }

    fn next(&mut self) -> Metadata {
        match self {
            MetadataSource::Fixed(metadata) => metadata.clone(),
            MetadataSource::Fresh { service, affinity } => {
                let mut rng = rand::rng();
                fleet::structured_metadata(&mut rng, affinity, service, 0, false)
            }
        }
    }
}

pub struct EmissionLoop {
    logger: AppLogger,
    metadata: MetadataSource,
    pacing: Pacing,
}

impl EmissionLoop {
    pub fn new(logger: AppLogger, metadata: MetadataSource, pacing: Pacing) -> Self {
        Self {
            logger,
            metadata,
            pacing,
        }
    }

    /// Runs until `cancel` fires, returning the number of lines the sink accepted.
    pub async fn run<F>(self, cancel: CancellationToken, mut render: F) -> u64
    where
        F: FnMut(DateTime<Utc>) -> Line + Send,
    {
        self.run_batch(cancel, move |t| [render(t)]).await
    }

    /// Like [`run`](Self::run) for renderers that may emit several lines per
    /// tick. All lines of one tick share a timestamp and a metadata bundle.
    pub async fn run_batch<F, I>(mut self, cancel: CancellationToken, mut render: F) -> u64
    where
        F: FnMut(DateTime<Utc>) -> I + Send,
        I: IntoIterator<Item = Line>,
        I::IntoIter: Send,
    {
        let mut delivered = 0u64;
        let mut failed = 0u64;

        while !cancel.is_cancelled() {
            let timestamp = Utc::now();
            let metadata = self.metadata.next();

            for line in render(timestamp) {
                match self
                    .logger
                    .log(line.level, timestamp, line.message, metadata.clone())
                    .await
                {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        failed += 1;
                        debug!(error = %e, failed, "line dropped");
                    }
                }
            }

            let delay = self.pacing.next_delay(&mut rand::rng());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = pause(delay) => {}
            }
        }

        delivered
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}
