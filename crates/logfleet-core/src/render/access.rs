//! HTTP access and error log formats

use super::{APACHE_ERROR_TIME, APACHE_TIME};
use crate::level::Level;
use crate::values;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

/// Suffix appended to failing mixed-format lines: logfmt fields, one of which
/// (`namespace`) collides with a stream label, plus a multi-line stack trace.
pub const STACKTRACE_SUFFIX: &str = r#"method=GET namespace=whoopsie caller=flush.go:253 stacktrace="Exception in thread \"main\" java.lang.NullPointerException\n        at com.example.myproject.Book.getTitle(Book.java:16)\n        at com.example.myproject.Author.getBookTitles(Author.java:25)\n        at com.example.myproject.Bootstrap.main(Bootstrap.java:14)""#;

const APACHE_SEVERITIES: [&str; 10] = [
    "emerg", "alert", "crit", "error", "warn", "notice", "info", "debug", "trace1", "trace2",
];

/// `{host} - {user} [{datetime}] "{method} {request} {protocol}" {status} {bytes}`
pub fn apache_common<R: Rng + ?Sized>(
    rng: &mut R,
    t: DateTime<Utc>,
    uri: &str,
    status: u16,
) -> String {
    format!(
        "{} - {} [{}] \"{} {} {}\" {} {}",
        values::random_ipv4(rng),
        values::random_auth_user_id(rng),
        t.format(APACHE_TIME),
        values::random_http_method(rng),
        uri,
        values::random_http_version(rng),
        status,
        rng.random_range(0..=30_000),
    )
}

/// Apache common plus `"{referrer}" "{agent}"`
pub fn apache_combined<R: Rng + ?Sized>(
    rng: &mut R,
    t: DateTime<Utc>,
    uri: &str,
    status: u16,
) -> String {
    format!(
        "{} - {} [{}] \"{} {} {}\" {} {} \"{}\" \"{}\"",
        values::fake_ip(rng),
        values::random_auth_user_id(rng),
        t.format(APACHE_TIME),
        values::random_http_method(rng),
        uri,
        values::random_http_version(rng),
        status,
        rng.random_range(30..=100_000),
        values::random_url(rng),
        values::random_user_agent(rng),
    )
}

/// `[{timestamp}] [{module}:{severity}] [pid {pid}:tid {tid}] [client {ip}:{port}] {message}`
///
/// Returns the level matching the rendered severity.
pub fn apache_error<R: Rng + ?Sized>(rng: &mut R, t: DateTime<Utc>) -> (Level, String) {
    let severity = APACHE_SEVERITIES.choose(rng).copied().unwrap_or("error");
    let level = match severity {
        "emerg" | "alert" | "crit" | "error" => Level::Error,
        "warn" => Level::Warn,
        "notice" | "info" => Level::Info,
        _ => Level::Debug,
    };
    let line = format!(
        "[{}] [{}:{}] [pid {}:tid {}] [client {}:{}] {}",
        t.format(APACHE_ERROR_TIME),
        values::random_word(rng).to_lowercase(),
        severity,
        rng.random_range(1..=10_000),
        rng.random_range(1..=10_000),
        values::random_ipv4(rng),
        rng.random_range(1..=65_535),
        values::random_phrase(rng),
    );
    (level, line)
}

/// NCSA Common Log Format, the nginx default
pub fn common_log<R: Rng + ?Sized>(
    rng: &mut R,
    t: DateTime<Utc>,
    uri: &str,
    status: u16,
) -> String {
    format!(
        "{} - {} [{}] \"{} {} {}\" {} {}",
        values::random_ipv4(rng),
        values::random_auth_user_id(rng),
        t.format(APACHE_TIME),
        values::random_http_method(rng),
        uri,
        values::random_http_version(rng),
        status,
        rng.random_range(0..=30_000),
    )
}

/// Field order follows the nginx `log_format` the line imitates.
#[derive(Serialize)]
struct JsonAccess<'a> {
    host: String,
    #[serde(rename = "user-identifier")]
    user_identifier: String,
    datetime: String,
    method: &'static str,
    request: &'a str,
    protocol: &'static str,
    status: u16,
    bytes: u32,
    referer: String,
    #[serde(rename = "_25values")]
    values_25: String,
}

/// Access record as a single JSON object
pub fn json_access<R: Rng + ?Sized>(
    rng: &mut R,
    t: DateTime<Utc>,
    uri: &str,
    status: u16,
) -> String {
    let record = JsonAccess {
        host: values::fake_ip(rng),
        user_identifier: values::random_auth_user_id(rng),
        datetime: t.format(APACHE_TIME).to_string(),
        method: values::random_http_method(rng),
        request: uri,
        protocol: values::random_http_version(rng),
        status,
        bytes: rng.random_range(0..=30_000),
        referer: values::random_url(rng),
        values_25: rng.random_range(0..=25u32).to_string(),
    };
    serde_json::to_string(&record).unwrap_or_default()
}
