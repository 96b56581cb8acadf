use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parses a push endpoint, accepting only http and https
pub(crate) fn parse_endpoint(url: &str) -> Result<reqwest::Url> {
    let parsed = reqwest::Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(Error::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        assert!(parse_endpoint("http://localhost:3100/loki/api/v1/push").is_ok());
        assert!(matches!(parse_endpoint("localhost:3100"), Err(Error::InvalidUrl { .. })));
        assert!(matches!(parse_endpoint("ftp://example.com"), Err(Error::InvalidUrl { .. })));
        assert!(matches!(parse_endpoint("not a url"), Err(Error::InvalidUrl { .. })));
    }
}
