//! Structured metadata attached to individual records
//!
//! Unlike labels, metadata does not take part in stream identity. Every
//! bundle built for a simulated pod carries `traceID`, `pod` and `user`.

use rand::Rng;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

pub const TRACE_ID: &str = "traceID";
pub const POD: &str = "pod";
pub const USER: &str = "user";

/// Ordered (name, value) pairs. Serializes as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(Vec<(String, String)>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.get(TRACE_ID)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str("]")
    }
}

/// Trace session affinity.
///
/// Each draw has a 50% chance of staying on the current trace; otherwise a
/// new trace is minted and becomes current. Owned by whoever builds metadata
/// (a fleet enumeration, a failing-pod stream) instead of living in a global.
#[derive(Debug, Clone, Default)]
pub struct TraceAffinity {
    current: Option<String>,
}

impl TraceAffinity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `trace` as the current trace
    pub fn starting_at(trace: impl Into<String>) -> Self {
        Self {
            current: Some(trace.into()),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        if let Some(current) = &self.current {
            if rng.random_bool(0.5) {
                return current.clone();
            }
        }

        let minted = new_trace_id(rng);
        self.current = Some(minted.clone());
        minted
    }
}

/// UUID built from the caller's RNG so seeded runs are reproducible
pub fn new_trace_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.random();
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use uuid::Uuid;

    #[test]
    fn test_metadata_keeps_insertion_order() {
        let md = Metadata::new()
            .with(TRACE_ID, "abc")
            .with(POD, "nginx-x1y2z")
            .with(USER, "14234");

        let names: Vec<&str> = md.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec![TRACE_ID, POD, USER]);
        assert_eq!(md.trace_id(), Some("abc"));
        assert_eq!(
            serde_json::to_string(&md).unwrap(),
            r#"{"traceID":"abc","pod":"nginx-x1y2z","user":"14234"}"#
        );
    }

    #[test]
    fn test_trace_affinity_reuse_rate() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut affinity = TraceAffinity::starting_at("prior");
        let draws = 20_000;
        let mut reused = 0;

        for _ in 0..draws {
            let before = affinity.current().map(str::to_owned);
            let trace = affinity.next(&mut rng);
            if before.as_deref() == Some(trace.as_str()) {
                reused += 1;
                assert_eq!(affinity.current(), before.as_deref());
            } else {
                // State moves exactly when a trace is minted
                assert_eq!(affinity.current(), Some(trace.as_str()));
                assert!(Uuid::parse_str(&trace).is_ok());
            }
        }

        let rate = reused as f64 / draws as f64;
        assert!((rate - 0.5).abs() < 0.02, "reuse rate {}", rate);
    }

    #[test]
    fn test_trace_affinity_mints_when_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut affinity = TraceAffinity::new();
        assert!(affinity.current().is_none());
        let first = affinity.next(&mut rng);
        assert_eq!(affinity.current(), Some(first.as_str()));
    }
}
