//! Log levels

use crate::error::UnknownLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warn, Level::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// HTTP status used by access-log renderers: info 2xx, warn 4xx, error 5xx.
    /// Debug lines are ordinary successful requests.
    pub fn status_code(self) -> u16 {
        match self {
            Level::Debug | Level::Info => 200,
            Level::Warn => 400,
            Level::Error => 500,
        }
    }

    /// Level implied by an HTTP status class
    pub fn from_status(status: u16) -> Self {
        match status / 100 {
            5 => Level::Error,
            4 => Level::Warn,
            _ => Level::Info,
        }
    }

    /// OTLP severity number
    pub fn severity_number(self) -> u32 {
        match self {
            Level::Debug => 5,
            Level::Info => 9,
            Level::Warn => 13,
            Level::Error => 17,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for level in Level::ALL {
            assert_eq!(level.as_str().parse::<Level>(), Ok(level));
        }
        assert!("fatal".parse::<Level>().is_err());
        assert!("INFO".parse::<Level>().is_err());
    }

    #[test]
    fn test_status_band() {
        assert_eq!(Level::Info.status_code() / 100, 2);
        assert_eq!(Level::Warn.status_code() / 100, 4);
        assert_eq!(Level::Error.status_code() / 100, 5);
        assert_eq!(Level::from_status(503), Level::Error);
        assert_eq!(Level::from_status(429), Level::Warn);
        assert_eq!(Level::from_status(204), Level::Info);
    }
}
