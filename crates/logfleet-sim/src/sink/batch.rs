//! Batching push worker shared by the network sinks
//!
//! `deliver` only enqueues. A background task drains the queue into batches,
//! flushing when a batch is full or the wait interval elapses, and retries a
//! failed push a bounded number of times before dropping it.

use crate::error::{Error, Result};
use async_trait::async_trait;
use logfleet_core::{DeliveryError, Entry, Sink};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Wire protocol of one backend
pub trait PushProtocol: Send + Sync + 'static {
    /// Short name used in logs
    const NAME: &'static str;

    fn endpoint(&self) -> &str;

    /// Builds the POST for one encoded batch, headers included
    fn request(&self, client: &Client, batch: &[Entry]) -> RequestBuilder;
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub batch_wait: Duration,
    /// Attempts after the first one
    pub max_retries: u32,
    /// Fixed pause between attempts
    pub retry_backoff: Duration,
    pub channel_capacity: usize,
    pub timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            batch_wait: Duration::from_secs(1),
            max_retries: 1,
            retry_backoff: Duration::from_millis(100),
            channel_capacity: 10_000,
            timeout: Duration::from_secs(5),
        }
    }
}

impl BatchConfig {
    /// The flush interval and batch size must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be at least 1".into()));
        }
        if self.batch_wait.is_zero() {
            return Err(Error::Config("batch wait must be longer than zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PushStats {
    pub sent: AtomicU64,
    pub failed: AtomicU64,
    pub retried: AtomicU64,
    pub dropped: AtomicU64,
    pub batches: AtomicU64,
}

pub struct BatchingSink<P> {
    tx: mpsc::Sender<Entry>,
    stats: Arc<PushStats>,
    _protocol: PhantomData<fn() -> P>,
}

impl<P: PushProtocol> BatchingSink<P> {
    /// Starts the push worker. It runs until `shutdown` fires (or every
    /// sender is gone), then drains the queue and flushes what is left.
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        protocol: P,
        config: BatchConfig,
        shutdown: CancellationToken,
    ) -> Result<(Self, JoinHandle<()>)> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .build()?;

        let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
        let stats = Arc::new(PushStats::default());
        let handle = tokio::spawn(worker(client, protocol, rx, config, stats.clone(), shutdown));

        Ok((
            Self {
                tx,
                stats,
                _protocol: PhantomData,
            },
            handle,
        ))
    }

    pub fn stats(&self) -> Arc<PushStats> {
        self.stats.clone()
    }
}

#[async_trait]
impl<P: PushProtocol> Sink for BatchingSink<P> {
    async fn deliver(&self, entry: Entry) -> Result<(), DeliveryError> {
        match self.tx.try_send(entry) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(DeliveryError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                Err(DeliveryError::Closed)
            }
        }
    }
}

async fn worker<P: PushProtocol>(
    client: Client,
    protocol: P,
    mut rx: mpsc::Receiver<Entry>,
    config: BatchConfig,
    stats: Arc<PushStats>,
    shutdown: CancellationToken,
) {
    let mut batch: Vec<Entry> = Vec::with_capacity(config.batch_size);
    let mut interval = tokio::time::interval(config.batch_wait);

    info!(sink = P::NAME, endpoint = %protocol.endpoint(), "push worker started");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(entry) => {
                    batch.push(entry);
                    if batch.len() >= config.batch_size {
                        flush(&client, &protocol, &mut batch, &config, &stats).await;
                    }
                }
                None => break,
            },
            _ = interval.tick() => {
                if !batch.is_empty() {
                    flush(&client, &protocol, &mut batch, &config, &stats).await;
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }

    rx.close();
    while let Ok(entry) = rx.try_recv() {
        batch.push(entry);
        if batch.len() >= config.batch_size {
            flush(&client, &protocol, &mut batch, &config, &stats).await;
        }
    }
    if !batch.is_empty() {
        flush(&client, &protocol, &mut batch, &config, &stats).await;
    }

    info!(
        sink = P::NAME,
        sent = stats.sent.load(Ordering::Relaxed),
        failed = stats.failed.load(Ordering::Relaxed),
        retried = stats.retried.load(Ordering::Relaxed),
        dropped = stats.dropped.load(Ordering::Relaxed),
        batches = stats.batches.load(Ordering::Relaxed),
        "push worker stopped"
    );
}

async fn flush<P: PushProtocol>(
    client: &Client,
    protocol: &P,
    batch: &mut Vec<Entry>,
    config: &BatchConfig,
    stats: &PushStats,
) {
    if batch.is_empty() {
        return;
    }

    let entries = std::mem::take(batch);
    let count = entries.len() as u64;

    for attempt in 0..=config.max_retries {
        match protocol.request(client, &entries).send().await {
            Ok(response) if response.status().is_success() => {
                stats.sent.fetch_add(count, Ordering::Relaxed);
                stats.batches.fetch_add(1, Ordering::Relaxed);
                debug!(sink = P::NAME, count, "batch pushed");
                return;
            }
            Ok(response) if !retryable(response.status()) => {
                warn!(sink = P::NAME, status = %response.status(), "push rejected");
                break;
            }
            Ok(response) => {
                warn!(sink = P::NAME, attempt, status = %response.status(), "push failed");
            }
            Err(e) => {
                warn!(sink = P::NAME, attempt, error = %e, "push failed");
            }
        }

        if attempt < config.max_retries {
            stats.retried.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(config.retry_backoff).await;
        }
    }

    stats.failed.fetch_add(count, Ordering::Relaxed);
    error!(sink = P::NAME, count, "dropped batch");
}

/// Server errors and rate limiting; any other rejection is final
fn retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
