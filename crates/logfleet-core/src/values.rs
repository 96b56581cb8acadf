//! Value Pools
//!
//! Fixed pools and per-call synthesized values used to fill label sets,
//! metadata and rendered lines. Every accessor takes the caller's RNG so a
//! seeded `StdRng` gives reproducible output in tests.

use crate::level::Level;
use fake::Fake;
use fake::faker::company::en::{BsNoun, Buzzword};
use fake::faker::internet::en::{DomainSuffix, IPv4, UserAgent, Username};
use fake::faker::lorem::en::{Sentence, Word};
use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::IndexedRandom;

pub const CLUSTERS: [&str; 4] = ["us-west-1", "us-east-1", "us-east-2", "eu-west-1"];

/// Stream shard values; the trailing empty entry leaves some streams unsharded
pub const SHARDS: [&str; 7] = ["0", "1", "2", "3", "4", "5", ""];

/// Values of the `env` label
pub const NAMESPACES: [&str; 5] = ["prod", "dev", "staging", "infra", "monitoring"];

pub const URIS: [&str; 13] = [
    "/api/loki/v1/query",
    "/api/loki/v1/push",
    "/api/loki/v1/patterns",
    "/api/loki/v1/label",
    "/api/loki/v1/label/values",
    "/api/loki/v1/label/names",
    "/api/loki/v1/label/series",
    "/api/mimir/v1/query",
    "/api/mimir/v1/push",
    "/api/mimir/v1/label",
    "/api/mimir/v1/label/values",
    "/api/pyroscope/v1/query",
    "/api/pyroscope/v1/push",
];

pub const ORG_IDS: [&str; 5] = ["1218", "29", "1010", "2419", "2919"];

pub const USER_IDS: [&str; 9] = [
    "14234", "03428", "10572", "94223", "08203", "93820", "12345", "54321", "67890",
];

pub const HTTP_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

pub const HTTP_VERSIONS: [&str; 3] = ["HTTP/1.0", "HTTP/1.1", "HTTP/2.0"];

const SEQUENCE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// A handful of client addresses reused across lines so per-IP queries match
static IP_POOL: Lazy<Vec<String>> = Lazy::new(|| {
    let mut rng = rand::rng();
    (0..5)
        .map(|_| IPv4().fake_with_rng::<String, _>(&mut rng))
        .collect()
});

static FILE_NAMES: Lazy<Vec<String>> = Lazy::new(|| {
    let mut rng = rand::rng();
    let mut names: Vec<String> = (0..3)
        .map(|_| {
            let adjective: String = Buzzword().fake_with_rng(&mut rng);
            let noun: String = BsNoun().fake_with_rng(&mut rng);
            format!("{} {}", adjective, noun)
        })
        .collect();
    names.extend((0..2).map(|_| Word().fake_with_rng::<String, _>(&mut rng)));
    names
        .into_iter()
        .map(|n| n.to_lowercase().replace(' ', "_"))
        .collect()
});

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// One of the known [`CLUSTERS`]
pub fn random_cluster<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, &CLUSTERS)
}

pub fn random_namespace<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, &NAMESPACES)
}

pub fn random_uri<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, &URIS)
}

pub fn random_org_id<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, &ORG_IDS)
}

pub fn random_user_id<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, &USER_IDS)
}

/// Weighted level: 5% error, 5% warn, the remaining 90% split between
/// debug and info.
pub fn random_level<R: Rng + ?Sized>(rng: &mut R) -> Level {
    match rng.random_range(0..100) {
        0..5 => Level::Error,
        5..10 => Level::Warn,
        _ => {
            if rng.random_bool(0.5) {
                Level::Debug
            } else {
                Level::Info
            }
        }
    }
}

/// `n` random characters from `[a-z0-9]`
pub fn random_sequence<R: Rng + ?Sized>(rng: &mut R, n: usize) -> String {
    (0..n)
        .map(|_| SEQUENCE_ALPHABET[rng.random_range(0..SEQUENCE_ALPHABET.len())] as char)
        .collect()
}

/// Request duration between 1ms and 30s, formatted like `850ms` or `12.34s`
pub fn random_duration<R: Rng + ?Sized>(rng: &mut R) -> String {
    format_duration_ms(rng.random_range(1..=30_000))
}

pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }
    let minutes = ms / 60_000;
    let secs = (ms % 60_000) / 1000;
    let millis = ms % 1000;

    let mut out = String::new();
    if minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    if millis == 0 {
        out.push_str(&format!("{}s", secs));
    } else {
        let frac = format!("{:03}", millis);
        out.push_str(&format!("{}.{}s", secs, frac.trim_end_matches('0')));
    }
    out
}

pub fn random_file_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    FILE_NAMES.choose(rng).cloned().unwrap_or_default()
}

/// One of the five process-wide client addresses
pub fn fake_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    IP_POOL.choose(rng).cloned().unwrap_or_default()
}

/// A fresh IPv4 address
pub fn random_ipv4<R: Rng + ?Sized>(rng: &mut R) -> String {
    IPv4().fake_with_rng(rng)
}

pub fn random_http_method<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, &HTTP_METHODS)
}

pub fn random_http_version<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    pick(rng, &HTTP_VERSIONS)
}

/// Either `-` or a lowercase user name, as seen in access logs
pub fn random_auth_user_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    if rng.random_bool(0.5) {
        "-".to_string()
    } else {
        Username().fake_with_rng::<String, _>(rng).to_lowercase()
    }
}

pub fn random_user_agent<R: Rng + ?Sized>(rng: &mut R) -> String {
    UserAgent().fake_with_rng(rng)
}

pub fn random_word<R: Rng + ?Sized>(rng: &mut R) -> String {
    Word().fake_with_rng(rng)
}

pub fn random_phrase<R: Rng + ?Sized>(rng: &mut R) -> String {
    let sentence: String = Sentence(4..8).fake_with_rng(rng);
    sentence.trim_end_matches('.').to_string()
}

pub fn random_domain<R: Rng + ?Sized>(rng: &mut R) -> String {
    let word: String = Word().fake_with_rng(rng);
    let suffix: String = DomainSuffix().fake_with_rng(rng);
    format!("{}.{}", word.to_lowercase(), suffix)
}

pub fn random_url<R: Rng + ?Sized>(rng: &mut R) -> String {
    let domain = random_domain(rng);
    let path: String = Word().fake_with_rng(rng);
    format!("https://www.{}/{}", domain, path.to_lowercase())
}

/// Random path built from a few words, e.g. `/alpha/beta`
pub fn random_resource_uri<R: Rng + ?Sized>(rng: &mut R) -> String {
    let depth = rng.random_range(1..=3);
    let mut uri = String::new();
    for _ in 0..depth {
        uri.push('/');
        uri.push_str(&Word().fake_with_rng::<String, _>(rng).to_lowercase());
    }
    uri
}

const DATABASE_ERRORS: [&str; 5] = [
    "sql error",
    "syntax error in sql statement",
    "deadlock detected while waiting for lock",
    "too many connections",
    "connection to database lost",
];
const GRPC_ERRORS: [&str; 5] = [
    "rpc error: code = Unavailable desc = connection refused",
    "rpc error: code = DeadlineExceeded desc = context deadline exceeded",
    "rpc error: code = ResourceExhausted desc = grpc: received message larger than max",
    "rpc error: code = Canceled desc = context canceled",
    "rpc error: code = Internal desc = stream terminated by RST_STREAM",
];
const OBJECT_ERRORS: [&str; 4] = [
    "object not found",
    "invalid object key",
    "access denied to bucket",
    "object store request timed out",
];
const RUNTIME_ERRORS: [&str; 4] = [
    "panic: runtime error: index out of range",
    "panic: runtime error: invalid memory address or nil pointer dereference",
    "fatal error: concurrent map writes",
    "runtime: out of memory",
];
const HTTP_ERRORS: [&str; 4] = [
    "http: server closed idle connection",
    "unexpected EOF",
    "502 bad gateway",
    "request entity too large",
];
const GENERIC_ERRORS: [&str; 5] = [
    "operation failed",
    "invalid argument",
    "resource temporarily unavailable",
    "permission denied",
    "i/o timeout",
];

/// Error message drawn from one of several families
pub fn random_error<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    let family: &[&'static str] = match rng.random_range(0..10) {
        0 => &DATABASE_ERRORS,
        1 => &GRPC_ERRORS,
        2 => &OBJECT_ERRORS,
        3 => &RUNTIME_ERRORS,
        4 => &HTTP_ERRORS,
        _ => &GENERIC_ERRORS,
    };
    pick(rng, family)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_level_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 100_000;
        let mut counts = [0usize; 4];
        for _ in 0..draws {
            counts[random_level(&mut rng).index()] += 1;
        }

        let rate = |level: Level| counts[level.index()] as f64 / draws as f64;
        assert!((rate(Level::Error) - 0.05).abs() < 0.005, "error {}", rate(Level::Error));
        assert!((rate(Level::Warn) - 0.05).abs() < 0.005, "warn {}", rate(Level::Warn));
        assert!((rate(Level::Debug) + rate(Level::Info) - 0.90).abs() < 0.007);
        assert!((rate(Level::Debug) - 0.45).abs() < 0.01, "debug {}", rate(Level::Debug));
        assert!((rate(Level::Info) - 0.45).abs() < 0.01, "info {}", rate(Level::Info));
    }

    #[test]
    fn test_random_sequence_alphabet() {
        let mut rng = StdRng::seed_from_u64(3);
        let seq = random_sequence(&mut rng, 32);
        assert_eq!(seq.len(), 32);
        assert!(seq.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(1), "1ms");
        assert_eq!(format_duration_ms(999), "999ms");
        assert_eq!(format_duration_ms(1000), "1s");
        assert_eq!(format_duration_ms(1500), "1.5s");
        assert_eq!(format_duration_ms(12_345), "12.345s");
        assert_eq!(format_duration_ms(30_000), "30s");
        assert_eq!(format_duration_ms(61_050), "1m1.05s");
    }

    #[test]
    fn test_pools_are_fixed() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            assert!(CLUSTERS.contains(&random_cluster(&mut rng)));
            assert!(ORG_IDS.contains(&random_org_id(&mut rng)));
            assert!(USER_IDS.contains(&random_user_id(&mut rng)));
            assert!(URIS.contains(&random_uri(&mut rng)));
            assert!(IP_POOL.contains(&fake_ip(&mut rng)));
        }
        let name = random_file_name(&mut rng);
        assert!(!name.is_empty());
        assert!(!name.contains(' '));
    }
}
