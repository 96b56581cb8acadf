//! Component profiles
//!
//! A profile describes how a component talks: which renderer, which levels,
//! and at what cadence. Starting a profile for one pod spawns one emission
//! loop per stream and hands back their join handles.

use crate::emission::{EmissionLoop, MetadataSource, Pacing};
use chrono::{DateTime, Utc};
use logfleet_core::render::{Line, access, logfmt, syslog};
use logfleet_core::{AppLogger, Level, Metadata, values};
use rand::rngs::ThreadRng;
use std::collections::BTreeMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Access-log style components draw a level and sleep up to this long
pub const ACCESS_LOG_PACING: Pacing = Pacing::jitter_ms(5000);

/// Renders one message body for a fixed-level stream
pub type Template = fn(&mut ThreadRng, DateTime<Utc>) -> String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessFormat {
    ApacheCommon,
    ApacheCombined,
    CommonLog,
    Json,
    /// JSON lines, with an extra common-log line carrying a stack trace ahead
    /// of every error
    JsonMixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// RFC 3164 syslog, no level label
    Rfc3164,
    /// RFC 5424 syslog, no level label
    Rfc5424,
    ApacheError,
    /// logfmt application lines mixed with HTTP request lines
    Application,
    Mysql,
}

/// One fixed-level sub-stream of a multi-stream component
#[derive(Debug, Clone, Copy)]
pub struct Stream {
    pub level: Level,
    pub template: Template,
    pub pacing: Pacing,
}

impl Stream {
    pub const fn new(level: Level, template: Template, pacing: Pacing) -> Self {
        Self {
            level,
            template,
            pacing,
        }
    }
}

/// A gRPC-logging sub-stream; `error` is set on the failing stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcStream {
    pub error: Option<String>,
    pub pacing: Pacing,
}

/// gRPC request logs keyed by level, one loop per level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcProfile {
    pub method: String,
    pub streams: BTreeMap<Level, GrpcStream>,
}

impl GrpcProfile {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            streams: BTreeMap::new(),
        }
    }

    pub fn stream(mut self, level: Level, error: Option<&str>, pacing: Pacing) -> Self {
        self.streams.insert(
            level,
            GrpcStream {
                error: error.map(str::to_owned),
                pacing,
            },
        );
        self
    }
}

/// A pod that keeps failing: every line claims a fresh replica
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverProfile {
    pub service: String,
    pub grpc: GrpcProfile,
}

#[derive(Debug, Clone)]
pub enum ComponentProfile {
    AccessLog(AccessFormat),
    Text(TextFormat),
    MultiStream(Vec<Stream>),
    GrpcStyle(GrpcProfile),
    Failover(FailoverProfile),
}

impl ComponentProfile {
    pub fn kind(&self) -> &'static str {
        match self {
            ComponentProfile::AccessLog(_) => "access-log",
            ComponentProfile::Text(_) => "text",
            ComponentProfile::MultiStream(_) => "multi-stream",
            ComponentProfile::GrpcStyle(_) => "grpc",
            ComponentProfile::Failover(_) => "failover",
        }
    }

    /// Number of emission loops a single pod runs
    pub fn stream_count(&self) -> usize {
        match self {
            ComponentProfile::AccessLog(_) | ComponentProfile::Text(_) => 1,
            ComponentProfile::MultiStream(streams) => streams.len(),
            ComponentProfile::GrpcStyle(grpc) => grpc.streams.len(),
            ComponentProfile::Failover(failover) => failover.grpc.streams.len(),
        }
    }

    /// Spawns this pod's loops. A failover profile ignores `metadata` and
    /// builds a new bundle for every line.
    pub fn start(
        &self,
        cancel: &CancellationToken,
        logger: AppLogger,
        metadata: Metadata,
    ) -> Vec<JoinHandle<u64>> {
        match self {
            ComponentProfile::AccessLog(format) => {
                let source = MetadataSource::Fixed(metadata);
                let emission = EmissionLoop::new(logger, source, ACCESS_LOG_PACING);
                let render = access_renderer(*format);
                vec![tokio::spawn(emission.run_batch(cancel.clone(), render))]
            }
            ComponentProfile::Text(format) => {
                let source = MetadataSource::Fixed(metadata);
                let emission = EmissionLoop::new(logger, source, ACCESS_LOG_PACING);
                vec![tokio::spawn(emission.run(cancel.clone(), text_renderer(*format)))]
            }
            ComponentProfile::MultiStream(streams) => streams
                .iter()
                .map(|stream| {
                    let source = MetadataSource::Fixed(metadata.clone());
                    let emission = EmissionLoop::new(logger.clone(), source, stream.pacing);
                    let Stream { level, template, .. } = *stream;
                    tokio::spawn(emission.run(cancel.clone(), move |t| {
                        Line::new(level, template(&mut rand::rng(), t))
                    }))
                })
                .collect(),
            ComponentProfile::GrpcStyle(grpc) => {
                start_grpc(grpc, cancel, &logger, || MetadataSource::Fixed(metadata.clone()))
            }
            ComponentProfile::Failover(failover) => {
                start_grpc(&failover.grpc, cancel, &logger, || {
                    MetadataSource::fresh(&failover.service)
                })
            }
        }
    }
}

fn start_grpc(
    grpc: &GrpcProfile,
    cancel: &CancellationToken,
    logger: &AppLogger,
    metadata: impl Fn() -> MetadataSource,
) -> Vec<JoinHandle<u64>> {
    grpc.streams
        .values()
        .map(|stream| {
            let emission = EmissionLoop::new(logger.clone(), metadata(), stream.pacing);
            let method = grpc.method.clone();
            let error = stream.error.clone();
            tokio::spawn(emission.run(cancel.clone(), move |t| {
                logfmt::grpc(&mut rand::rng(), t, error.as_deref(), &method)
            }))
        })
        .collect()
}

fn access_renderer(format: AccessFormat) -> impl FnMut(DateTime<Utc>) -> Vec<Line> + Send {
    move |t| {
        let mut rng = rand::rng();
        let level = values::random_level(&mut rng);
        let uri = values::random_uri(&mut rng);
        let status = level.status_code();

        let mut lines = Vec::with_capacity(2);
        let message = match format {
            AccessFormat::ApacheCommon => access::apache_common(&mut rng, t, uri, status),
            AccessFormat::ApacheCombined => access::apache_combined(&mut rng, t, uri, status),
            AccessFormat::CommonLog => access::common_log(&mut rng, t, uri, status),
            AccessFormat::Json => access::json_access(&mut rng, t, uri, status),
            AccessFormat::JsonMixed => {
                if level == Level::Error {
                    let clf = access::common_log(&mut rng, t, uri, status);
                    lines.push(Line::new(level, format!("{} {}", clf, access::STACKTRACE_SUFFIX)));
                }
                access::json_access(&mut rng, t, uri, status)
            }
        };
        lines.push(Line::new(level, message));
        lines
    }
}

fn text_renderer(format: TextFormat) -> impl FnMut(DateTime<Utc>) -> Line + Send {
    move |t| {
        let mut rng = rand::rng();
        match format {
            TextFormat::Rfc3164 => syslog::rfc3164(&mut rng, t),
            TextFormat::Rfc5424 => syslog::rfc5424(&mut rng, t),
            TextFormat::ApacheError => {
                let (level, message) = access::apache_error(&mut rng, t);
                Line::new(level, message)
            }
            TextFormat::Application => logfmt::application(&mut rng, t),
            TextFormat::Mysql => logfmt::mysql(&mut rng, t),
        }
    }
}

/// Tempo-shaped component: eight independent streams at fixed levels,
/// including a version banner every 20s.
pub fn noisy_tempo() -> ComponentProfile {
    use logfmt::tempo;

    ComponentProfile::MultiStream(vec![
        Stream::new(Level::Debug, tempo::broadcast_invalidation, Pacing::jitter_ms(1000)),
        Stream::new(Level::Warn, tempo::trace_too_large, Pacing::jitter_ms(3000)),
        Stream::new(Level::Info, tempo::flushed_block, Pacing::jitter_ms(4000)),
        Stream::new(Level::Info, tempo::poll_complete, Pacing::jitter_ms(7000)),
        Stream::new(Level::Info, tempo::completing_block, Pacing::jitter_ms(1000)),
        Stream::new(Level::Error, tempo::memcached_timeout, Pacing::jitter_ms(2000)),
        Stream::new(Level::Info, tempo::collecting_metrics, Pacing::jitter_ms(5000)),
        Stream::new(Level::Info, tempo::startup_banner, Pacing::every_ms(20_000)),
    ])
}

/// Healthy ingester pushing over gRPC
pub fn mimir_pod() -> ComponentProfile {
    ComponentProfile::GrpcStyle(
        GrpcProfile::new(logfmt::INGESTER_PUSH).stream(Level::Info, None, ACCESS_LOG_PACING),
    )
}

pub const FAILING_POD_ERROR: &str = "connection refused to object store";

/// Ingester that cannot reach object storage: slow errors, fast successes
pub fn failing_pod(service: &str) -> ComponentProfile {
    ComponentProfile::Failover(FailoverProfile {
        service: service.to_string(),
        grpc: GrpcProfile::new(logfmt::INGESTER_PUSH)
            .stream(Level::Error, Some(FAILING_POD_ERROR), Pacing::jitter_ms(10_000))
            .stream(Level::Info, None, Pacing::jitter_ms(500)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use logfleet_core::labels::{LEVEL, LabelSet, SERVICE_NAME};
    use logfleet_core::metadata::POD;
    use logfleet_core::{Entry, FnSink, Sink};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_stream_counts() {
        assert_eq!(noisy_tempo().stream_count(), 8);
        assert_eq!(mimir_pod().stream_count(), 1);
        assert_eq!(failing_pod("mimir-ingester").stream_count(), 2);
        assert_eq!(ComponentProfile::AccessLog(AccessFormat::Json).stream_count(), 1);
    }

    #[test]
    fn test_access_renderer_status_matches_level() {
        let mut render = access_renderer(AccessFormat::Json);
        for _ in 0..200 {
            for line in render(noon()) {
                let level = line.level.unwrap();
                let parsed: serde_json::Value = serde_json::from_str(&line.message).unwrap();
                assert_eq!(parsed["status"].as_u64(), Some(level.status_code() as u64));
            }
        }
    }

    #[test]
    fn test_mixed_json_prefixes_errors_with_stacktrace() {
        let mut render = access_renderer(AccessFormat::JsonMixed);
        let mut saw_error = false;
        for _ in 0..500 {
            let lines = render(noon());
            let level = lines.last().and_then(|l| l.level).unwrap();
            if level == Level::Error {
                saw_error = true;
                assert_eq!(lines.len(), 2);
                assert!(lines[0].message.contains("stacktrace="));
                assert!(serde_json::from_str::<serde_json::Value>(&lines[1].message).is_ok());
            } else {
                assert_eq!(lines.len(), 1);
            }
        }
        assert!(saw_error);
    }

    #[test]
    fn test_syslog_lines_are_unleveled() {
        let mut render = text_renderer(TextFormat::Rfc5424);
        assert_eq!(render(noon()).level, None);
    }

    #[test]
    fn test_tempo_templates_match_their_level() {
        let ComponentProfile::MultiStream(streams) = noisy_tempo() else {
            panic!("expected multi-stream");
        };
        for stream in streams {
            let message = (stream.template)(&mut rand::rng(), noon());
            assert!(message.starts_with(&format!("level={}", stream.level)), "{}", message);
        }
    }

    #[tokio::test]
    async fn test_failover_uses_fresh_metadata() {
        let seen = Arc::new(Mutex::new(Vec::<Entry>::new()));
        let sink_seen = seen.clone();
        let sink: Arc<dyn Sink> = Arc::new(FnSink::new(move |entry: Entry| {
            sink_seen.lock().unwrap().push(entry);
            Ok(())
        }));
        let logger = AppLogger::new(LabelSet::new().with(SERVICE_NAME, "mimir-ingester"), sink);
        let cancel = CancellationToken::new();

        let handles = failing_pod("mimir-ingester").start(&cancel, logger, Metadata::new());
        assert_eq!(handles.len(), 2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }

        let seen = seen.lock().unwrap();
        assert!(!seen.is_empty());
        for entry in seen.iter() {
            assert!(entry.metadata.get(POD).unwrap().starts_with("mimir-ingester-"));
            match entry.labels.get(LEVEL) {
                Some("error") => assert!(entry.message.contains(FAILING_POD_ERROR)),
                Some("info") => assert!(!entry.message.contains("err=")),
                other => panic!("unexpected level {:?}", other),
            }
        }
    }
}
