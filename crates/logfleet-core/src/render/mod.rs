//! Renderers
//!
//! Pure `(rng, timestamp, context) -> line` functions for every simulated
//! log format. Content is random, structure is fixed per format.

pub mod access;
pub mod logfmt;
pub mod syslog;

use crate::level::Level;

/// Apache / Common Log Format timestamp, e.g. `02/Jan/2006:15:04:05 +0000`
pub const APACHE_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";
/// Apache error log timestamp, e.g. `Mon Jan 02 15:04:05.000000 2006`
pub const APACHE_ERROR_TIME: &str = "%a %b %d %H:%M:%S%.6f %Y";
/// BSD syslog timestamp, e.g. `Jan 02 15:04:05`
pub const RFC3164_TIME: &str = "%b %d %H:%M:%S";
/// RFC5424 timestamp, e.g. `2006-01-02T15:04:05.000Z`
pub const RFC5424_TIME: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// One rendered record. `level` is `None` for formats that carry no level,
/// which leaves the stream on its base label set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub level: Option<Level>,
    pub message: String,
}

impl Line {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level: Some(level),
            message: message.into(),
        }
    }

    pub fn unleveled(message: impl Into<String>) -> Self {
        Self {
            level: None,
            message: message.into(),
        }
    }
}
