//! Application logfmt lines mimicking specific backend components

use super::Line;
use crate::level::Level;
use crate::values;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;

/// The gRPC method every simulated ingester pod logs
pub const INGESTER_PUSH: &str = "/cortex.Ingester/Push";

const HTTP_STATUSES: [u16; 14] = [
    200, 200, 200, 201, 204, 301, 304, 400, 401, 403, 404, 429, 500, 503,
];

const MYSQL_SUBSYSTEMS: [&str; 4] = ["InnoDB", "Server", "Repl", "Parser"];

pub fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Tempo-style component logs. Each is a fixed template with random fields.
pub mod tempo {
    use super::*;

    pub fn broadcast_invalidation<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> String {
        format!(
            "level=debug ts={} caller=broadcast.go:48 msg=\"Invalidating forwarded broadcast\" key=collectors/compactor version={} oldVersion={} content=[compactor-{}] oldContent=[compactor-{}]",
            ts(t),
            rng.random_range(0..100),
            rng.random_range(0..100),
            values::random_sequence(rng, 5),
            values::random_sequence(rng, 5),
        )
    }

    pub fn trace_too_large<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> String {
        format!(
            "level=warn ts={} caller=instance.go:43 msg=\"TRACE_TOO_LARGE: max size of trace (52428800) exceeded tenant {}\"",
            ts(t),
            values::random_org_id(rng),
        )
    }

    pub fn flushed_block<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> String {
        format!(
            "level=info ts={} caller=compactor.go:242 msg=\"flushed to block\" bytes={}B objects={} values={}",
            ts(t),
            rng.random_range(0..1000),
            rng.random_range(0..1000),
            rng.random_range(0..1000),
        )
    }

    pub fn poll_complete<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> String {
        format!(
            "level=info ts={} caller=poller.go:133 msg=\"blocklist poll complete\" seconds={}",
            ts(t),
            rng.random_range(0..1000),
        )
    }

    pub fn completing_block<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> String {
        format!(
            "level=info ts={} caller=flush.go:253 msg=\"completing block\" userid={} blockID={}",
            ts(t),
            values::random_org_id(rng),
            values::random_sequence(rng, 5),
        )
    }

    pub fn memcached_timeout<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> String {
        format!(
            "level=error ts={} caller=memcached.go:153 msg=\"Failed to get keys from memcached\" err=\"memcache: connect timeout to {}:11211\"",
            ts(t),
            values::fake_ip(rng),
        )
    }

    pub fn collecting_metrics<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> String {
        format!(
            "level=info ts={} caller=registry.go:232 tenant={} msg=\"collecting metrics\" active_series={}",
            ts(t),
            values::random_org_id(rng),
            rng.random_range(0..1000),
        )
    }

    pub fn startup_banner<R: Rng + ?Sized>(_rng: &mut R, t: DateTime<Utc>) -> String {
        format!(
            "level=info ts={} caller=main.go:107 msg=\"Starting Grafana Enterprise Traces\" version=\"version=weekly-r138-f1920489, branch=weekly-r138, revision=f1920489\"",
            ts(t),
        )
    }
}

/// `ts caller=grpc_logging.go:66 tenant level method duration msg=gRPC [err]`
///
/// A failing call is logged at error and only ever names one of the first
/// three tenants.
pub fn grpc<R: Rng + ?Sized>(
    rng: &mut R,
    t: DateTime<Utc>,
    err: Option<&str>,
    method: &str,
) -> Line {
    let (level, tenant) = match err {
        Some(_) => (
            Level::Error,
            values::ORG_IDS[rng.random_range(0..values::ORG_IDS.len() - 2)],
        ),
        None => (Level::Info, values::random_org_id(rng)),
    };

    let mut message = format!(
        "ts={} caller=grpc_logging.go:66 tenant={} level={} method={} duration={} msg=gRPC",
        ts(t),
        tenant,
        level,
        method,
        values::random_duration(rng),
    );
    if let Some(err) = err {
        message.push_str(&format!(" err=\"{}\"", err));
    }
    Line::new(level, message)
}

/// `ts caller=http.go:194 level traceID orgID msg="METHOD URI (status) duration"`
pub fn http<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> Line {
    let status = HTTP_STATUSES.choose(rng).copied().unwrap_or(200);
    let level = Level::from_status(status);
    Line::new(
        level,
        format!(
            "ts={} caller=http.go:194 level={} traceID={} orgID={} msg=\"{} {} ({}) {}\"",
            ts(t),
            level,
            values::random_sequence(rng, 16),
            values::random_org_id(rng),
            values::random_http_method(rng),
            values::random_resource_uri(rng),
            status,
            values::random_duration(rng),
        ),
    )
}

/// Generic application line; one in five is an HTTP request line instead.
pub fn application<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> Line {
    if rng.random_range(0..10) < 2 {
        return http(rng, t);
    }

    let level = values::random_level(rng);
    let mut message = format!(
        "ts={} caller={}.go:{} level={} traceID={} orgID={} msg=\"{}\" duration=\"{}\"",
        ts(t),
        values::random_file_name(rng),
        rng.random_range(1..=300),
        level,
        values::random_sequence(rng, 16),
        values::random_org_id(rng),
        values::random_phrase(rng),
        values::random_duration(rng),
    );
    if level == Level::Error {
        message.push_str(&format!(" error=\"{}\"", values::random_error(rng)));
    }
    Line::new(level, message)
}

/// MySQL error log, e.g.
/// `2020-08-06T14:25:02.835618Z 0 [Note] [MY-012487] [InnoDB] DDL log recovery : begin`
pub fn mysql<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> Line {
    let level = values::random_level(rng);
    let severity = match level {
        Level::Debug => "Note",
        Level::Info => "System",
        Level::Warn => "Warning",
        Level::Error => "ERROR",
    };
    Line::new(
        level,
        format!(
            "{} {} [{}] [MY-{:06}] [{}] {}",
            t.to_rfc3339_opts(SecondsFormat::Micros, true),
            rng.random_range(0..=4),
            severity,
            rng.random_range(10_000..=13_999),
            MYSQL_SUBSYSTEMS.choose(rng).copied().unwrap_or("Server"),
            values::random_phrase(rng),
        ),
    )
}
