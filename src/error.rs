use thiserror::Error;

/// Failures recovered at the company boundary and turned into a
/// `ScrapeOutcome`. None of these abort a run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No ATS endpoint found after {tried} candidate(s)")]
    DiscoveryExhausted { tried: usize },
}

impl ScrapeError {
    /// Whether another attempt could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Transport(_) => true,
            ScrapeError::Status { status, .. } => *status == 429 || *status >= 500,
            ScrapeError::Parse(_) | ScrapeError::DiscoveryExhausted { .. } => false,
        }
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScrapeError::Transport(format!("request timed out: {}", err))
        } else {
            ScrapeError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(err: serde_json::Error) -> Self {
        ScrapeError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ScrapeError::Transport("connection reset".into()).is_transient());
        assert!(ScrapeError::Status { status: 503, url: "u".into() }.is_transient());
        assert!(ScrapeError::Status { status: 429, url: "u".into() }.is_transient());
        assert!(!ScrapeError::Status { status: 404, url: "u".into() }.is_transient());
        assert!(!ScrapeError::Parse("missing field".into()).is_transient());
    }

    #[test]
    fn test_json_errors_become_parse_errors() {
        let err = serde_json::from_str::<serde_json::Value>("{\"jobs\": [").unwrap_err();
        let err: ScrapeError = err.into();
        assert!(matches!(err, ScrapeError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error"));
    }
}
