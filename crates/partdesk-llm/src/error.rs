//! Errors from external-service clients.

use thiserror::Error;

/// Things that go wrong talking to a language model or the remote catalog.
///
/// These never reach the message pipeline directly; they fold into an
/// [`ExternalOutcome`](crate::ExternalOutcome).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} is not configured")]
    NotConfigured(String),
    #[error("HTTP client setup failed: {0}")]
    ClientBuild(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("service returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    /// Whether this error means the service is out of reach rather than
    /// misbehaving.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LlmError::NotConfigured(_) | LlmError::Timeout(_) | LlmError::Connect(_)
        )
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(err.to_string())
        } else if err.is_connect() {
            LlmError::Connect(err.to_string())
        } else if err.is_decode() {
            LlmError::Decode(err.to_string())
        } else {
            LlmError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_display() {
        assert_eq!(
            LlmError::NotConfigured("deepseek".to_string()).to_string(),
            "deepseek is not configured"
        );
        assert_eq!(
            LlmError::Status {
                status: 429,
                body: "slow down".to_string()
            }
            .to_string(),
            "service returned status 429: slow down"
        );
        assert_eq!(
            LlmError::EmptyResponse.to_string(),
            "service returned an empty response"
        );
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(LlmError::Timeout("t".to_string()).is_unavailable());
        assert!(LlmError::Connect("c".to_string()).is_unavailable());
        assert!(LlmError::NotConfigured("x".to_string()).is_unavailable());
        assert!(!LlmError::Decode("d".to_string()).is_unavailable());
        assert!(!LlmError::EmptyResponse.is_unavailable());
        assert!(!LlmError::Status {
            status: 500,
            body: String::new()
        }
        .is_unavailable());
    }

    #[test]
    fn test_from_serde_json_is_decode() {
        let err: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: LlmError = err.unwrap_err().into();
        assert!(matches!(err, LlmError::Decode(_)));
    }
}
