//! Three-state result of a call to an external service.

use crate::error::LlmError;

/// What came back from an external call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalOutcome<T> {
    /// The service answered with a usable payload.
    Success(T),
    /// No credential configured, or the service could not be reached in time.
    Unavailable,
    /// The service answered, but not with anything usable.
    Failed(String),
}

impl<T> ExternalOutcome<T> {
    /// The payload, discarding why there was none.
    pub fn success(self) -> Option<T> {
        match self {
            ExternalOutcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Short state name for log fields.
    pub fn state(&self) -> &'static str {
        match self {
            ExternalOutcome::Success(_) => "success",
            ExternalOutcome::Unavailable => "unavailable",
            ExternalOutcome::Failed(_) => "failed",
        }
    }
}

/// Timeouts and connection failures mean "unavailable"; anything else the
/// transport reports is a failure with a reason.
impl<T> From<Result<T, LlmError>> for ExternalOutcome<T> {
    fn from(result: Result<T, LlmError>) -> Self {
        match result {
            Ok(v) => ExternalOutcome::Success(v),
            Err(e) if e.is_unavailable() => ExternalOutcome::Unavailable,
            Err(e) => ExternalOutcome::Failed(e.to_string()),
        }
    }
}
